//! Store error types.

use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The object does not exist.
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// An object with the same identity already exists.
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },

    /// The write was based on a stale resource version (optimistic concurrency).
    #[error("conflict writing {kind} {key}: resource version {expected:?} is stale")]
    Conflict {
        kind: &'static str,
        key: String,
        expected: Option<String>,
    },

    /// The store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Returns true if the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if the write lost an optimistic concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
