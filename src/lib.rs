use wasm_bindgen::prelude::*;
use serde_wasm_bindgen::{from_value, to_value};
use console_error_panic_hook;
use web_sys::console as console;
use ndarray::Array2;

pub mod colormap;
pub mod error;
pub mod fourier;
pub mod lattice;
pub mod phase;
pub mod render;
pub mod surface;

pub use colormap::Colormap;
pub use error::{Error, Result};
pub use lattice::{circle_lattice_means, demo_lattice, gaussian_lattice, Atom};
pub use phase::{magnitude, mix_frequency, mix_from_spatial, mix_to_spatial, phase};
pub use render::{phase_intensity_image, phase_intensity_plot, RenderOptions, RenderTarget};
pub use surface::{Axes, Colorbar, Figure};

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    console::log_1(&"Hello from Rust, panic hook has been initialised!".into());
}

/// Reshape a flat row-major buffer handed over from JavaScript.
pub fn array_from_flat(data: Vec<f64>, rows: usize, cols: usize) -> Result<Array2<f64>> {
    if data.len() != error::checked_len(&[rows, cols])? {
        return Err(Error::ShapeMismatch { left: (rows, cols), right: (data.len(), 1) });
    }
    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

/// Fourier-transform a real image, centre the zero frequency and draw its phase plot.
pub fn spatial_phase_figure(
    spatial: &Array2<f64>,
    width: usize,
    height: usize,
    options: &RenderOptions,
) -> Result<Figure> {
    let ft = fourier::array_fft(&fourier::real_to_complex(spatial))?;
    let centred = fourier::fft_shift(&ft);
    match phase_intensity_plot(&centred, RenderTarget::NewFigure { width, height }, options)? {
        Some(figure) => Ok(figure),
        None => Err(Error::ConfigurationError("no figure was created".to_string())),
    }
}

fn js_error(context: &str, err: Error) -> JsValue {
    console::log_1(&format!("Error {}: {}", context, err).into());
    JsValue::from_str(&err.to_string())
}

fn options_from_js(options: JsValue) -> std::result::Result<RenderOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(RenderOptions::default());
    }
    from_value(options).map_err(|err| {
        console::log_1(&format!("Error deserializing render options: {:?}", err).into());
        JsValue::from_str(&err.to_string())
    })
}

/// RGBA8 pixels (`width * height * 4` bytes) of the phase plot of a real image.
#[wasm_bindgen]
pub fn render_phase_plot(
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    width: usize,
    height: usize,
    options: JsValue,
) -> std::result::Result<Vec<u8>, JsValue> {
    let options = options_from_js(options)?;
    let spatial = array_from_flat(data, rows, cols).map_err(|e| js_error("reading image", e))?;
    let figure = spatial_phase_figure(&spatial, width, height, &options)
        .map_err(|e| js_error("rendering phase plot", e))?;
    figure.rasterize().map_err(|e| js_error("rasterizing phase plot", e))
}

/// Colorbar ticks and labels to draw next to a plot from [`render_phase_plot`].
#[wasm_bindgen]
pub fn phase_colorbar(colormap: &str) -> std::result::Result<JsValue, JsValue> {
    let colormap: Colormap = colormap.parse().map_err(|e| js_error("choosing colormap", e))?;
    to_value(&Colorbar::phase(colormap)).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Real-space image with the Fourier magnitudes of `a` and the phases of `b`.
#[wasm_bindgen]
pub fn mix_spatial(a: Vec<f64>, b: Vec<f64>, rows: usize, cols: usize) -> std::result::Result<Vec<f64>, JsValue> {
    let a = array_from_flat(a, rows, cols).map_err(|e| js_error("reading magnitude source", e))?;
    let b = array_from_flat(b, rows, cols).map_err(|e| js_error("reading phase source", e))?;
    let mixed = mix_to_spatial(&a, &b).map_err(|e| js_error("mixing", e))?;
    Ok(mixed.iter().cloned().collect())
}

/// Flattened `(uc_size * n_tiles)^2` lattice; `means` is an array of `{x, y}` objects.
#[wasm_bindgen]
pub fn make_gaussian_lattice(
    n_atoms: usize,
    uc_size: usize,
    n_tiles: usize,
    means: JsValue,
) -> std::result::Result<Vec<f64>, JsValue> {
    let means: Vec<Atom> = from_value(means).map_err(|err| {
        console::log_1(&format!("Error deserializing atom positions: {:?}", err).into());
        JsValue::from_str(&err.to_string())
    })?;
    let lattice = gaussian_lattice(n_atoms, uc_size, n_tiles, &means)
        .map_err(|e| js_error("building lattice", e))?;
    Ok(lattice.iter().cloned().collect())
}
