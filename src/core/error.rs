//! Error types for RaptorAlloc.

use thiserror::Error;

/// Result type alias for RaptorAlloc operations.
pub type Result<T> = std::result::Result<T, AllocError>;

/// Error types for the allocation engine.
#[derive(Error, Debug)]
pub enum AllocError {
    /// Key sets of a baseline table and its active weights differ.
    #[error("Key mismatch in {context}: missing {missing:?}, unexpected {unexpected:?}")]
    KeyMismatch {
        context: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Sequence length mismatch (e.g. strategic row vs. profile count).
    #[error("Length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Reference to an asset class that does not exist at level 1.
    #[error("Unknown asset class: {id}")]
    UnknownClass { id: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// User input outside the permitted range.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Failed to read a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AllocError {
    /// Create a key mismatch error.
    pub fn key_mismatch(
        context: impl Into<String>,
        missing: Vec<String>,
        unexpected: Vec<String>,
    ) -> Self {
        Self::KeyMismatch {
            context: context.into(),
            missing,
            unexpected,
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create an unknown class error.
    pub fn unknown_class(id: impl Into<String>) -> Self {
        Self::UnknownClass { id: id.into() }
    }

    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }
}

#[cfg(feature = "python")]
impl From<AllocError> for pyo3::PyErr {
    fn from(err: AllocError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
