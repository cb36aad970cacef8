//! Error types shared across the fieldkit workspace.

use thiserror::Error;

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Primary error type for field collection operations.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The requested key has no cached index entry and no fill path exists.
    #[error("no index entry for key: {0}")]
    NotFound(String),

    /// A selection request used unsupported syntax or values.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A remapping template could not be parsed or resolved.
    #[error("invalid remapping: {0}")]
    InvalidRemapping(String),

    /// An internal consistency check failed. Signals a logic defect in the
    /// remapping/joiner pairing, not a transient condition.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// No converter is registered for the requested data format.
    #[error("unsupported data format: {0}")]
    UnsupportedFormat(String),

    /// Field data could not be read or assembled.
    #[error("data error: {0}")]
    DataError(String),
}

impl FieldError {
    /// Create a NotFound error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create an InvalidSelection error.
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    /// Create an InvalidRemapping error.
    pub fn invalid_remapping(msg: impl Into<String>) -> Self {
        Self::InvalidRemapping(msg.into())
    }

    /// Create an InvariantViolation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a DataError.
    pub fn data_error(msg: impl Into<String>) -> Self {
        Self::DataError(msg.into())
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSelection(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for FieldError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::InvalidSelection(format!("YAML error: {}", err))
    }
}
