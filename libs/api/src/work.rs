//! Works: per-cluster materialized workloads.

use serde::{Deserialize, Serialize};

use crate::{ObjectMeta, Workload};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    #[serde(default)]
    pub manifests: Vec<Workload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSpec {
    pub workload: WorkloadTemplate,
}

/// A workload materialized for one cluster.
///
/// The work's namespace is the target cluster's execution space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub metadata: ObjectMeta,
    pub spec: WorkSpec,
}

impl Work {
    pub fn new(metadata: ObjectMeta, manifest: Workload) -> Self {
        Self {
            metadata,
            spec: WorkSpec {
                workload: WorkloadTemplate {
                    manifests: vec![manifest],
                },
            },
        }
    }
}
