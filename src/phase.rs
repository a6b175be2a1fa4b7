use std::f64::consts::PI;

use ndarray::{Array2, Zip};
use num_complex::Complex;
use tracing::debug;

use crate::error::{ensure_same_shape, Result};
use crate::fourier;

/// Element-wise absolute value.
pub fn magnitude(field: &Array2<Complex<f64>>) -> Array2<f64> {
    field.mapv(|z| z.norm())
}

/// Element-wise angle, atan2(im, re), in (-π, π].
pub fn phase(field: &Array2<Complex<f64>>) -> Array2<f64> {
    field.mapv(|z| z.im.atan2(z.re))
}

/// Adds π to every negative angle. Only a visual tweak: the result is not a
/// normalised angle (it covers [0, π) twice over).
pub fn wrap_negative_phase(theta: &mut Array2<f64>) {
    theta.mapv_inplace(|t| if t < 0.0 { t + PI } else { t });
}

/// Combines the magnitude of `field_for_magnitude` with the phase of `field_for_phase`.
pub fn mix_frequency(
    field_for_magnitude: &Array2<Complex<f64>>,
    field_for_phase: &Array2<Complex<f64>>,
) -> Result<Array2<Complex<f64>>> {
    ensure_same_shape(field_for_magnitude.dim(), field_for_phase.dim())?;

    let r = magnitude(field_for_magnitude);
    let theta = phase(field_for_phase);
    Ok(Zip::from(&r)
        .and(&theta)
        .map_collect(|&r, &theta| Complex::from_polar(r, theta)))
}

/// Fourier-transforms two real arrays and mixes the magnitude of the first
/// with the phase of the second.
pub fn mix_from_spatial(source_a: &Array2<f64>, source_b: &Array2<f64>) -> Result<Array2<Complex<f64>>> {
    ensure_same_shape(source_a.dim(), source_b.dim())?;
    debug!(shape = ?source_a.dim(), "mixing spatial arrays");

    let ft_a = fourier::array_fft(&fourier::real_to_complex(source_a))?;
    let ft_b = fourier::array_fft(&fourier::real_to_complex(source_b))?;
    mix_frequency(&ft_a, &ft_b)
}

/// As [`mix_from_spatial`], then transformed back to real space.
///
/// The imaginary part left over by the mixing is discarded.
pub fn mix_to_spatial(source_a: &Array2<f64>, source_b: &Array2<f64>) -> Result<Array2<f64>> {
    let mixed = mix_from_spatial(source_a, source_b)?;
    Ok(fourier::array_ifft(&mixed)?.mapv(|z| z.re))
}
