//! Controller error types.

use std::fmt;
use std::time::Duration;

use fanout_api::ManifestError;
use fanout_names::NameError;
use thiserror::Error;

use crate::overrides::OverrideError;
use crate::store::StoreError;

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors that can occur while reconciling a binding.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An execution space, work name or cluster name could not be derived.
    #[error("name derivation failed: {0}")]
    Naming(#[from] NameError),

    /// Override policies could not be applied for a cluster.
    #[error("failed to apply overrides for cluster {cluster}: {source}")]
    Override {
        cluster: String,
        #[source]
        source: OverrideError,
    },

    /// The workload manifest could not be read or rewritten.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Override records could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Materializing the work for one cluster failed.
    #[error("failed to ensure work for {workload} in cluster {cluster} (binding {binding}): {source}")]
    EnsureWork {
        binding: String,
        cluster: String,
        workload: String,
        #[source]
        source: Box<ControllerError>,
    },

    /// Per-cluster replica counts could not be determined.
    #[error("failed to determine desired replicas for {workload} (binding {binding}): {source}")]
    DesiredReplicas {
        binding: String,
        workload: String,
        #[source]
        source: Box<ControllerError>,
    },

    /// The reconciliation did not finish in time.
    #[error("reconcile of {binding} timed out after {elapsed:?}")]
    Timeout { binding: String, elapsed: Duration },

    /// Several independent operations failed.
    #[error(transparent)]
    Aggregate(#[from] ErrorAggregate),
}

/// Ordered collection of errors from operations that all ran to completion.
#[derive(Debug, Default)]
pub struct ErrorAggregate(Vec<ControllerError>);

impl ErrorAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: impl Into<ControllerError>) {
        self.0.push(err.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ControllerError] {
        &self.0
    }

    /// `Ok` when nothing was collected.
    pub fn into_result(self) -> ControllerResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ControllerError::Aggregate(self))
        }
    }
}

impl fmt::Display for ErrorAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "[")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{err}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::error::Error for ErrorAggregate {}
