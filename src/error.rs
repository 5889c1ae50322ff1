use thiserror::Error;

/// Errors reported by the filter engine.
///
/// Every operation validates its input before allocating output, so an error
/// never comes with a partially filtered raster.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parameter out of range: {name} = {value} ({reason})")]
    ParameterOutOfRange {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// Reject planes with a zero-sized dimension.
pub(crate) fn ensure_non_empty(height: usize, width: usize, what: &str) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(FilterError::InvalidInput(format!(
            "{what} has zero size ({height}x{width})"
        )));
    }
    Ok(())
}
