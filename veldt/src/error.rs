//! Error types for spatial index construction.

use thiserror::Error;

/// Errors that can occur when configuring a spatial index.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Capacity parameters violate `max_elements >= 2` or
    /// `1 <= min_elements <= max_elements / 2`.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpatialError::InvalidParameters("max_elements must be at least 2".into());
        assert_eq!(
            err.to_string(),
            "invalid parameters: max_elements must be at least 2"
        );
    }
}
