use ndarray::Array3;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use tracing::warn;

use crate::colormap::Colormap;
use crate::error::{checked_len, Error, Result};

/// Pixels reserved to the right of the plot for the colorbar and its labels.
const COLORBAR_WIDTH: usize = 110;
const PLOT_MARGIN: i32 = 10;
const LABEL_FONT_SIZE: u32 = 16;
/// Colorbar x range: the bar covers [0, 1], ticks and labels sit to its right.
const COLORBAR_X_EXTENT: f64 = 2.5;

/// A plotting area holding at most one RGBA image (rows x cols x 4, values in [0, 1]).
#[derive(Default, Clone, Debug)]
pub struct Axes {
    image: Option<Array3<f64>>,
}

impl Axes {
    pub fn new() -> Axes {
        Axes { image: None }
    }

    /// Show `image`, replacing whatever was displayed before.
    pub fn imshow(&mut self, image: Array3<f64>) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&Array3<f64>> {
        self.image.as_ref()
    }

    /// Draw the image so it fills `area`, row 0 at the top. Each element is
    /// blended over what the area already holds using its alpha.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let image = match &self.image {
            Some(image) => image,
            None => return Ok(()),
        };
        let (rows, cols, channels) = image.dim();
        if rows == 0 || cols == 0 || channels < 4 {
            return Ok(());
        }

        let mut chart = ChartBuilder::on(area).build_cartesian_2d(0f64..cols as f64, 0f64..rows as f64)?;
        chart.draw_series((0..rows).flat_map(|i| {
            let y0 = (rows - i - 1) as f64;
            (0..cols).map(move |j| {
                let color = rgb_color([image[[i, j, 0]], image[[i, j, 1]], image[[i, j, 2]]]);
                let alpha = num::clamp(image[[i, j, 3]], 0.0, 1.0);
                Rectangle::new([(j as f64, y0), ((j + 1) as f64, y0 + 1.0)], color.mix(alpha).filled())
            })
        }))?;
        Ok(())
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Colorbar {
    pub colormap: Colormap,
    /// Tick positions in colour-map coordinates, 0 at the bottom and 1 at the top.
    pub ticks: Vec<f64>,
    pub tick_labels: Vec<String>,
}

impl Colorbar {
    /// Five ticks spread over [0, 1] but labelled as angles from 0 to 2π.
    /// The labels are cosmetic; the colours underneath are unchanged.
    pub fn phase(colormap: Colormap) -> Colorbar {
        Colorbar {
            colormap,
            ticks: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            tick_labels: ["0", "π/2", "π", "3π/2", "2π"].iter().map(|s| s.to_string()).collect(),
        }
    }

    fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, steps: usize) -> Result<()> {
        let mut chart = ChartBuilder::on(area)
            .margin(PLOT_MARGIN)
            .build_cartesian_2d(0f64..COLORBAR_X_EXTENT, -0.05f64..1.05f64)?;

        let steps = steps.max(1);
        let delta = 1.0 / steps as f64;
        chart.draw_series((0..steps).map(|step| {
            let v0 = delta * step as f64;
            let color = rgb_color(self.colormap.rgb(v0 + 0.5 * delta));
            Rectangle::new([(0.0, v0), (1.0, v0 + delta)], color.filled())
        }))?;
        chart.draw_series(
            self.ticks
                .iter()
                .map(|&t| PathElement::new(vec![(1.0, t), (1.15, t)], BLACK.stroke_width(2))),
        )?;

        // text needs a system font; the bar is still usable without its labels
        let style = ("sans-serif", LABEL_FONT_SIZE)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        let labels = chart.draw_series(
            self.ticks
                .iter()
                .zip(self.tick_labels.iter())
                .map(|(&t, label)| Text::new(label.clone(), (1.25, t), style.clone())),
        );
        if let Err(err) = labels {
            warn!(error = %err, "colorbar labels not drawn");
        }
        Ok(())
    }
}

/// Top-level drawing surface: one axes, optionally with a colorbar beside it.
#[derive(Clone, Debug)]
pub struct Figure {
    width: usize,
    height: usize,
    axes: Axes,
    colorbar: Option<Colorbar>,
}

impl Figure {
    pub fn new(width: usize, height: usize) -> Figure {
        Figure { width, height, axes: Axes::new(), colorbar: None }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn axes_mut(&mut self) -> &mut Axes {
        &mut self.axes
    }

    pub fn colorbar(&self) -> Option<&Colorbar> {
        self.colorbar.as_ref()
    }

    /// Attach a colorbar describing the image on the axes.
    pub fn add_colorbar(&mut self, colorbar: Colorbar) -> Result<()> {
        if self.axes.image.is_none() {
            return Err(Error::ConfigurationError(
                "a colorbar needs an image on the axes".to_string(),
            ));
        }
        if colorbar.ticks.len() != colorbar.tick_labels.len() {
            return Err(Error::ConfigurationError(format!(
                "{} colorbar ticks but {} labels",
                colorbar.ticks.len(),
                colorbar.tick_labels.len()
            )));
        }
        self.colorbar = Some(colorbar);
        Ok(())
    }

    /// Draw the figure onto any plotters area: white background, the axes
    /// image and, when present, the labelled colorbar on the right.
    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE)?;
        match &self.colorbar {
            Some(colorbar) => {
                let plot_width = self.width.checked_sub(COLORBAR_WIDTH).filter(|w| *w > 0).ok_or_else(|| {
                    Error::ConfigurationError(format!(
                        "a {}px wide figure has no room beside a {}px colorbar",
                        self.width, COLORBAR_WIDTH
                    ))
                })?;
                let split = i32::try_from(plot_width).map_err(|_| {
                    Error::ConfigurationError(format!("{plot_width} pixels is too large a figure"))
                })?;
                let (plot_area, colorbar_area) = root.split_horizontally(split);
                self.axes.draw(&plot_area.margin(PLOT_MARGIN, PLOT_MARGIN, PLOT_MARGIN, PLOT_MARGIN))?;
                colorbar.draw(&colorbar_area, self.height)?;
            }
            None => {
                self.axes.draw(&root.margin(PLOT_MARGIN, PLOT_MARGIN, PLOT_MARGIN, PLOT_MARGIN))?;
            }
        }
        Ok(())
    }

    /// Opaque RGBA8 bytes for the whole figure, laid out for a canvas `ImageData`.
    pub fn rasterize(&self) -> Result<Vec<u8>> {
        let (width, height) = (to_u32(self.width)?, to_u32(self.height)?);
        let mut rgb = vec![0u8; checked_len(&[self.width, self.height, 3])?];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            self.draw(&root)?;
            root.present()?;
        }

        let mut rgba = Vec::with_capacity(checked_len(&[self.width, self.height, 4])?);
        for pixel in rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
        }
        Ok(rgba)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ConfigurationError(format!("{value} pixels is too large a figure")))
}

fn rgb_color(rgb: [f64; 3]) -> RGBColor {
    RGBColor(to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]))
}

fn to_byte(value: f64) -> u8 {
    (num::clamp(value, 0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rows: usize, cols: usize, rgba: [f64; 4]) -> Array3<f64> {
        Array3::from_shape_fn((rows, cols, 4), |(_, _, c)| rgba[c])
    }

    fn pixel(pixels: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width + x) * 4;
        [pixels[offset], pixels[offset + 1], pixels[offset + 2], pixels[offset + 3]]
    }

    fn near(actual: [u8; 4], expected: [u8; 4]) -> bool {
        actual.iter().zip(expected.iter()).all(|(a, e)| (*a as i32 - *e as i32).abs() <= 2)
    }

    #[test]
    fn colorbar_without_image_is_rejected() {
        let mut fig = Figure::new(10, 10);
        assert!(matches!(
            fig.add_colorbar(Colorbar::phase(Colormap::Hsv)),
            Err(Error::ConfigurationError(_))
        ));
    }

    #[test]
    fn phase_colorbar_labels() {
        let cb = Colorbar::phase(Colormap::Hsv);
        assert_eq!(cb.ticks, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(cb.tick_labels, vec!["0", "π/2", "π", "3π/2", "2π"]);
    }

    #[test]
    fn transparent_pixels_show_white_background() {
        let mut fig = Figure::new(40, 30);
        fig.axes_mut().imshow(solid(1, 1, [1.0, 0.0, 0.0, 0.0]));
        let pixels = fig.rasterize().unwrap();
        assert_eq!(pixels.len(), 40 * 30 * 4);
        assert!(pixels.iter().all(|&b| b >= 253));
    }

    #[test]
    fn opaque_pixels_keep_their_colour() {
        let mut fig = Figure::new(40, 40);
        fig.axes_mut().imshow(solid(2, 2, [0.0, 0.0, 1.0, 1.0]));
        let pixels = fig.rasterize().unwrap();
        assert!(near(pixel(&pixels, 40, 20, 20), [0, 0, 255, 255]));
        // outside the margin stays white
        assert!(near(pixel(&pixels, 40, 2, 2), [255, 255, 255, 255]));
    }

    #[test]
    fn colorbar_sits_right_of_the_plot() {
        let (width, height) = (200, 120);
        let mut fig = Figure::new(width, height);
        fig.axes_mut().imshow(solid(3, 3, [0.0, 0.0, 0.0, 1.0]));
        fig.add_colorbar(Colorbar::phase(Colormap::Hsv)).unwrap();
        let pixels = fig.rasterize().unwrap();

        assert!(near(pixel(&pixels, width, 45, 60), [0, 0, 0, 255]));
        // the bar spans x = 100..136 and changes colour from bottom to top
        let low = pixel(&pixels, width, 110, 95);
        let high = pixel(&pixels, width, 110, 25);
        assert!(!near(low, [255, 255, 255, 255]));
        assert!(!near(high, [255, 255, 255, 255]));
        assert!(!near(low, high));
    }

    #[test]
    fn narrow_figure_has_no_room_for_a_colorbar() {
        let mut fig = Figure::new(COLORBAR_WIDTH, 50);
        fig.axes_mut().imshow(solid(1, 1, [0.0, 0.0, 0.0, 1.0]));
        fig.add_colorbar(Colorbar::phase(Colormap::Hsv)).unwrap();
        assert!(matches!(fig.rasterize(), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn axes_draw_onto_a_caller_area() {
        let mut axes = Axes::new();
        axes.imshow(solid(1, 1, [1.0, 0.0, 0.0, 1.0]));
        let mut rgb = vec![0u8; 20 * 20 * 3];
        {
            let area = BitMapBackend::with_buffer(&mut rgb, (20, 20)).into_drawing_area();
            area.fill(&WHITE).unwrap();
            axes.draw(&area).unwrap();
            area.present().unwrap();
        }
        let centre = (10 * 20 + 10) * 3;
        assert_eq!(&rgb[centre..centre + 3], &[255, 0, 0]);
    }
}
