use ndarray::{s, Array2, Array3};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::colormap::Colormap;
use crate::error::{Error, Result};
use crate::phase;
use crate::surface::{Axes, Colorbar, Figure};

pub const DEFAULT_FIGURE_SIZE: usize = 800;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Draw a colorbar labelled in radians. Needs a figure of our own.
    pub colorbar: bool,
    /// Floor for the alpha channel; alpha is remapped from [0, 1] to [min_alpha, 1].
    pub min_alpha: f64,
    /// Add π to negative phases before colouring.
    pub wrap_phase: bool,
    pub colormap: Colormap,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions { colorbar: true, min_alpha: 0.0, wrap_phase: false, colormap: Colormap::Hsv }
    }
}

/// Where the phase plot is drawn.
pub enum RenderTarget<'a> {
    /// A fresh figure of the given pixel size, returned to the caller.
    NewFigure { width: usize, height: usize },
    /// Axes owned by the caller. There is no figure to hang a colorbar on.
    Axes(&'a mut Axes),
}

impl Default for RenderTarget<'_> {
    fn default() -> Self {
        RenderTarget::NewFigure { width: DEFAULT_FIGURE_SIZE, height: DEFAULT_FIGURE_SIZE }
    }
}

/// Colour each element by its phase and make it as opaque as its relative
/// magnitude. Returns rows x cols x RGBA, flipped so row 0 is the bottom row
/// of the input.
///
/// `field` should already have its zero frequency centred (see `fourier::fft_shift`).
pub fn phase_intensity_image(field: &Array2<Complex<f64>>, options: &RenderOptions) -> Result<Array3<f64>> {
    if !(0.0..=1.0).contains(&options.min_alpha) {
        return Err(Error::ConfigurationError(format!(
            "min_alpha must lie in [0, 1], got {}",
            options.min_alpha
        )));
    }

    let r = phase::magnitude(field);
    if let Some(((i, j), value)) = r.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::DegenerateInput(format!(
            "cannot normalise alpha: magnitude at ({i}, {j}) is {value}"
        )));
    }
    let max_r = r.iter().cloned().fold(0.0_f64, f64::max);
    if !(max_r > 0.0) {
        return Err(Error::DegenerateInput(format!(
            "cannot normalise alpha: maximum magnitude of the {}x{} field is {}",
            field.nrows(),
            field.ncols(),
            max_r
        )));
    }

    let mut theta = phase::phase(field);
    if options.wrap_phase {
        phase::wrap_negative_phase(&mut theta);
    }
    let normalised = autoscale(&theta);

    let (rows, cols) = field.dim();
    let mut image = Array3::<f64>::zeros((rows, cols, 4));
    for ((i, j), &t) in normalised.indexed_iter() {
        let [red, green, blue] = options.colormap.rgb(t);
        let alpha = options.min_alpha + (1.0 - options.min_alpha) * r[[i, j]] / max_r;
        image.slice_mut(s![i, j, ..]).assign(&ndarray::arr1(&[red, green, blue, alpha]));
    }

    Ok(image.slice(s![..;-1, .., ..]).to_owned())
}

/// Render `field` following Cowtan's phase colouring onto `target`.
///
/// A new figure is returned for [`RenderTarget::NewFigure`]; drawing into
/// caller-supplied axes returns `None`. Asking for a colorbar on caller axes
/// fails before anything is drawn.
pub fn phase_intensity_plot(
    field: &Array2<Complex<f64>>,
    target: RenderTarget<'_>,
    options: &RenderOptions,
) -> Result<Option<Figure>> {
    if options.colorbar {
        if let RenderTarget::Axes(_) = target {
            return Err(Error::ConfigurationError(
                "a colorbar needs the parent figure; pass RenderTarget::NewFigure or disable the colorbar"
                    .to_string(),
            ));
        }
    }

    let image = phase_intensity_image(field, options)?;
    debug!(shape = ?field.dim(), colormap = %options.colormap, colorbar = options.colorbar, "phase intensity plot");

    match target {
        RenderTarget::NewFigure { width, height } => {
            if width == 0 || height == 0 {
                return Err(Error::ConfigurationError(format!(
                    "figure size must be non-zero, got {width}x{height}"
                )));
            }
            let mut figure = Figure::new(width, height);
            figure.axes_mut().imshow(image);
            if options.colorbar {
                figure.add_colorbar(Colorbar::phase(options.colormap))?;
            }
            Ok(Some(figure))
        }
        RenderTarget::Axes(axes) => {
            axes.imshow(image);
            Ok(None)
        }
    }
}

/// Linear map of `values` onto [0, 1] using their own minimum and maximum.
/// A constant array maps to zeros.
fn autoscale(values: &Array2<f64>) -> Array2<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range > 0.0) {
        return values.mapv(|_| 0.0);
    }
    values.mapv(|v| (v - min) / range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn field() -> Array2<Complex<f64>> {
        array![
            [Complex::new(2.0, 0.0), Complex::new(0.0, 1.0)],
            [Complex::new(-1.0, 0.0), Complex::new(0.0, -0.5)],
        ]
    }

    #[test]
    fn colorbar_on_caller_axes_is_a_configuration_error() {
        let mut axes = Axes::new();
        let options = RenderOptions { colorbar: true, ..Default::default() };
        let result = phase_intensity_plot(&field(), RenderTarget::Axes(&mut axes), &options);
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
        assert!(axes.image().is_none());
    }

    #[test]
    fn caller_axes_receive_the_image() {
        let mut axes = Axes::new();
        let options = RenderOptions { colorbar: false, ..Default::default() };
        let result = phase_intensity_plot(&field(), RenderTarget::Axes(&mut axes), &options).unwrap();
        assert!(result.is_none());
        assert_eq!(axes.image().unwrap().dim(), (2, 2, 4));
    }

    #[test]
    fn new_figure_carries_colorbar() {
        let figure = phase_intensity_plot(&field(), RenderTarget::default(), &RenderOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(figure.width(), DEFAULT_FIGURE_SIZE);
        assert_eq!(figure.colorbar().unwrap().tick_labels.len(), 5);
        assert_eq!(figure.rasterize().unwrap().len(), DEFAULT_FIGURE_SIZE * DEFAULT_FIGURE_SIZE * 4);
    }

    #[test]
    fn alpha_is_relative_magnitude_and_rows_are_flipped() {
        let options = RenderOptions { colorbar: false, ..Default::default() };
        let image = phase_intensity_image(&field(), &options).unwrap();
        // input row 1 becomes output row 0
        assert!((image[[0, 0, 3]] - 0.5).abs() < 1e-12);
        assert!((image[[0, 1, 3]] - 0.25).abs() < 1e-12);
        assert!((image[[1, 0, 3]] - 1.0).abs() < 1e-12);
        assert!((image[[1, 1, 3]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn phase_is_autoscaled_before_colouring() {
        let options = RenderOptions { colorbar: false, ..Default::default() };
        let image = phase_intensity_image(&field(), &options).unwrap();
        // phases are 0, π/2, π, -π/2; -π/2 is the minimum and so red, as is π at the top of the range
        let red = Colormap::Hsv.rgb(0.0);
        for c in 0..3 {
            assert!((image[[0, 1, c]] - red[c]).abs() < 1e-12);
            assert!((image[[0, 0, c]] - red[c]).abs() < 1e-12);
        }
    }

    #[test]
    fn min_alpha_floor() {
        let options = RenderOptions { colorbar: false, min_alpha: 0.2, ..Default::default() };
        let mut f = field();
        f[[1, 1]] = Complex::new(0.0, 0.0);
        let image = phase_intensity_image(&f, &options).unwrap();
        assert!((image[[0, 1, 3]] - 0.2).abs() < 1e-12);
        assert!((image[[1, 0, 3]] - 1.0).abs() < 1e-12);

        let bad = RenderOptions { min_alpha: 1.5, ..options };
        assert!(matches!(phase_intensity_image(&f, &bad), Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn non_finite_magnitudes_are_degenerate() {
        let options = RenderOptions { colorbar: false, ..Default::default() };
        for bad in [
            Complex::new(f64::INFINITY, 0.0),
            Complex::new(f64::NAN, 1.0),
            Complex::new(0.0, f64::NEG_INFINITY),
        ] {
            let field = array![[bad, Complex::new(1.0, 0.0)]];
            assert!(matches!(phase_intensity_image(&field, &options), Err(Error::DegenerateInput(_))));
        }
    }

    #[test]
    fn all_zero_field_is_degenerate() {
        let zeros = Array2::<Complex<f64>>::zeros((3, 3));
        let result = phase_intensity_plot(&zeros, RenderTarget::default(), &RenderOptions::default());
        assert!(matches!(result, Err(Error::DegenerateInput(_))));
    }

    #[test]
    fn wrapped_phase_changes_colours_of_negative_angles_only() {
        let plain = RenderOptions { colorbar: false, ..Default::default() };
        let wrapped = RenderOptions { wrap_phase: true, ..plain };
        let field = array![[Complex::new(-1.0, 0.0), Complex::new(0.0, 1.0), Complex::new(0.0, -1.0)]];
        let a = phase_intensity_image(&field, &plain).unwrap();
        let b = phase_intensity_image(&field, &wrapped).unwrap();
        // phases π, π/2, -π/2 wrap to π, π/2, π/2, so the last two pixels now share a colour
        for c in 0..3 {
            assert!((b[[0, 1, c]] - b[[0, 2, c]]).abs() < 1e-12);
        }
        assert!((0..3).any(|c| (a[[0, 1, c]] - a[[0, 2, c]]).abs() > 1e-6));
    }
}
