//! # Error Types
//!
//! Errors raised while constructing domain objects and wire-model values.

use thiserror::Error;

/// Errors that can occur when building shared domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Text could not be parsed as an event identifier.
    #[error("Invalid event id: {0}")]
    InvalidEventId(String),

    /// An item header declares a length its payload does not have.
    #[error("Item length mismatch: header declares {declared} bytes, payload has {actual}")]
    LengthMismatch { declared: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_message() {
        let err = ModelError::LengthMismatch {
            declared: 10,
            actual: 3,
        };
        assert!(err.to_string().contains("declares 10 bytes"));
        assert!(err.to_string().contains("has 3"));
    }
}
