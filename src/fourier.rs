use ndarray::Array2;
use fft2d::slice::{fft_2d, ifft_2d};
use num_complex::Complex;

use crate::error::Result;

/// Forward 2D DFT, unnormalised, in the same (row, column) orientation as the input.
pub fn array_fft(array: &Array2<Complex<f64>>) -> Result<Array2<Complex<f64>>> {
    if array.is_empty() {
        return Ok(array.clone());
    }
    let (height, width) = array.dim();
    let mut buffer: Vec<Complex<f64>> = array.iter().cloned().collect();
    fft_2d(width, height, &mut buffer);
    // fft_2d leaves its output transposed: `width` rows of `height` columns
    let transposed = Array2::from_shape_vec((width, height), buffer)?;
    Ok(transposed.reversed_axes().as_standard_layout().into_owned())
}

/// Inverse of [`array_fft`], including the 1/(rows*cols) normalisation.
pub fn array_ifft(array: &Array2<Complex<f64>>) -> Result<Array2<Complex<f64>>> {
    if array.is_empty() {
        return Ok(array.clone());
    }
    let (height, width) = array.dim();
    // the transposed buffer has `width` rows of `height`; ifft_2d transposes it back
    let mut buffer: Vec<Complex<f64>> = array.t().iter().cloned().collect();
    ifft_2d(height, width, &mut buffer);
    let mut result = Array2::from_shape_vec((height, width), buffer)?;
    array_fft_renormalise(&mut result);
    Ok(result)
}

pub fn array_fft_renormalise(array: &mut Array2<Complex<f64>>) {
    let norm_factor = array.len();
    if norm_factor == 0 {
        return;
    }
    array.mapv_inplace(|x| x / (norm_factor as f64));
}

pub fn real_to_complex(array: &Array2<f64>) -> Array2<Complex<f64>> {
    array.mapv(|a| Complex::new(a, 0.0))
}

/// Moves the zero-frequency component to the centre of the array.
pub fn fft_shift<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (nx, ny) = array.dim();
    // numpy convention: a shift by floor(n/2), so the source offset is ceil(n/2)
    let (sx, sy) = (nx - nx / 2, ny - ny / 2);
    Array2::from_shape_fn((nx, ny), |(i, j)| array[[(i + sx) % nx, (j + sy) % ny]].clone())
}

/// Undoes [`fft_shift`], including for odd dimensions.
pub fn ifft_shift<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (nx, ny) = array.dim();
    let (sx, sy) = (nx / 2, ny / 2);
    Array2::from_shape_fn((nx, ny), |(i, j)| array[[(i + sx) % nx, (j + sy) % ny]].clone())
}
