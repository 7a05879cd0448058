//! Error types for the news cloud core

use thiserror::Error;

/// Contract violations raised at configuration boundaries.
///
/// Environmental failures (timeouts, malformed feeds, full canvases) never
/// surface as a `CoreError`; they resolve to fewer results instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl CoreError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
