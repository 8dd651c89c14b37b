//! Reconciliation primitives for work materialization.
//!
//! Everything here is pure and synchronous so it can be tested without a
//! store or a runtime:
//!
//! - **Replica allocation**: split a total replica count across clusters by
//!   static weight, exactly, with a deterministic remainder.
//! - **Policy matching**: pick the one replica scheduling policy that
//!   governs a workload.
//! - **Backoff**: requeue delays for bindings whose reconciliation failed.
//!
//! # Invariants
//!
//! - Decisions are deterministic given the same inputs
//! - Allocations never lose or invent replicas when any weight matched

mod allocate;
mod backoff;
mod matcher;

use std::time::Duration;

pub use allocate::{allocate_replicas, sort_by_weight, ClusterWeight};
pub use backoff::Backoff;
pub use matcher::{match_policy, matching_policies};

/// Default interval between full resyncs of every binding.
pub const DEFAULT_RESYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Default first requeue delay after a failed reconciliation.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Default ceiling for requeue delays.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5 * 60);
