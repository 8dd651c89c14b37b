//! Error types for manifest access.

use thiserror::Error;

/// Errors that can occur when reading or writing manifest fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The field exists but holds a value of another type.
    #[error("field {path} is not {expected}")]
    FieldTypeMismatch { path: String, expected: &'static str },

    /// A parent of the field exists but is not an object.
    #[error("cannot set {path}: {parent} is not an object")]
    NotAnObject { path: String, parent: String },
}
