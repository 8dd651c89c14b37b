//! Error types for name generation and parsing.

use thiserror::Error;

/// Errors that can occur when generating or parsing derived names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// A required input was empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// The execution space name is missing the required prefix.
    #[error("execution space '{actual}' missing prefix '{expected}'")]
    MissingPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The name is not a valid DNS-1123 label.
    #[error("invalid name '{name}': {message}")]
    InvalidFormat { name: String, message: String },
}

impl NameError {
    /// Returns true if this error indicates an empty input.
    pub fn is_empty(&self) -> bool {
        matches!(self, NameError::Empty(_))
    }

    /// Returns true if this error indicates a prefix mismatch.
    pub fn is_prefix_error(&self) -> bool {
        matches!(self, NameError::MissingPrefix { .. })
    }
}
