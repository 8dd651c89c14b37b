//! # fanout-api
//!
//! Resource types consumed and produced by the fanout work materializer.
//!
//! ## Design Principles
//!
//! - Types mirror the stored wire shape (camelCase JSON)
//! - Workloads stay generic documents; only the fields the materializer
//!   needs are reached through explicit accessors
//! - Binding scope is a closed enum, callers never downcast
//!
//! ## Resources
//!
//! - `ResourceBinding` / `ClusterResourceBinding`: a scheduling decision
//! - `Cluster`: a member cluster and its labels
//! - `ReplicaSchedulingPolicy`: weighted replica allocation rules
//! - `Work`: the per-cluster materialized copy of a workload

pub mod constants;

mod binding;
mod cluster;
mod error;
mod manifest;
mod meta;
mod overrides;
mod policy;
mod selector;
mod work;

pub use binding::*;
pub use cluster::Cluster;
pub use error::ManifestError;
pub use manifest::Workload;
pub use meta::{LabelSet, ObjectMeta, ObjectReference};
pub use overrides::{AppliedOverrides, OverridePolicyShadow};
pub use policy::*;
pub use selector::*;
pub use work::{Work, WorkSpec, WorkloadTemplate};
