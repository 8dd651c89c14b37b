//! # fanout-names
//!
//! Deterministic name generation for the fanout work materializer.
//!
//! ## Design Principles
//!
//! - Every function here is pure: identical input always yields identical output
//! - A cluster's identity lives in the execution space (the namespace a work
//!   is stored in), never in the work's own name
//! - Execution space names roundtrip (cluster → space → cluster)
//!
//! ## Name Formats
//!
//! - Execution space: `fanout-es-{cluster}`
//! - Work: `{workload name}-{10 hex chars}` where the hash covers the
//!   lowercased `{namespace}-{name}-{kind}` triple

mod error;
mod space;
mod work;

pub use error::NameError;
pub use space::{cluster_name_from_execution_space, execution_space_name, EXECUTION_SPACE_PREFIX};
pub use work::work_name;
