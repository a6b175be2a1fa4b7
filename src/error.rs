use ndarray::ShapeError;
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Two arrays that are combined element-wise have different shapes.
    #[error("shape mismatch: {}x{} vs {}x{}", .left.0, .left.1, .right.0, .right.1)]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// An invalid combination of options, e.g. a colorbar on caller-supplied axes.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    /// The input carries no usable signal (every magnitude zero, or not finite).
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    /// An atom position lies outside the unit cell.
    #[error("atom {atom} has mean ({x}, {y}) outside the unit cell [0, {uc_size})")]
    InvalidMean { atom: usize, x: f64, y: f64, uc_size: usize },
    #[error("expected {expected} atom positions, found {found}")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),
    #[error("array shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("drawing error: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for Error {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Error::Drawing(err.to_string())
    }
}

/// Fails with [`Error::ShapeMismatch`] unless both arrays share a shape.
pub(crate) fn ensure_same_shape(left: (usize, usize), right: (usize, usize)) -> Result<()> {
    if left != right {
        return Err(Error::ShapeMismatch { left, right });
    }
    Ok(())
}

/// Product of buffer dimensions coming from outside, or a configuration error on overflow.
pub(crate) fn checked_len(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::ConfigurationError(format!("buffer dimensions {:?} overflow", dims)))
}
