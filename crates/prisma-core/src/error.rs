//! Engine error taxonomy.

use serde::{Deserialize, Serialize};

/// Errors raised by engine operations.
///
/// A failing operation is abandoned as a whole; no error ever degrades
/// into an unmodified buffer being returned as if it were processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "dimension mismatch: expected {expected_width}x{expected_height}, \
         got {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Build a [`EngineError::DimensionMismatch`] from two `(width, height)` pairs.
    pub fn dimensions(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }

    /// Stable code reported to callers alongside the message.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::UnknownOperation(_) => ErrorCode::UnknownOperation,
        }
    }
}

/// Wire-level classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidInput,
    DimensionMismatch,
    UnknownOperation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_variants() {
        assert_eq!(EngineError::invalid("x").code(), ErrorCode::InvalidInput);
        assert_eq!(
            EngineError::dimensions((2, 2), (3, 1)).code(),
            ErrorCode::DimensionMismatch
        );
        assert_eq!(
            EngineError::UnknownOperation("blur".into()).code(),
            ErrorCode::UnknownOperation
        );
    }

    #[test]
    fn test_dimension_message_names_both_sizes() {
        let msg = EngineError::dimensions((4, 3), (2, 2)).to_string();
        assert!(msg.contains("4x3"), "{msg}");
        assert!(msg.contains("2x2"), "{msg}");
    }
}
