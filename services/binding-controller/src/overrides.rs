//! Override policy application and bookkeeping.
//!
//! Override evaluation itself sits behind [`OverrideManager`]. This module
//! turns what it reports into the annotations recorded on a work.

use std::collections::BTreeMap;

use async_trait::async_trait;
use fanout_api::constants::{APPLIED_CLUSTER_OVERRIDES_ANNOTATION, APPLIED_OVERRIDES_ANNOTATION};
use fanout_api::{AppliedOverrides, LabelSet, ManifestError, Workload};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by an override manager.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// A policy could not be applied.
    #[error("override policy {policy} failed: {message}")]
    Policy { policy: String, message: String },

    /// A policy tried to write an impossible manifest path.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Override records for one cluster: cluster-wide first, namespaced second.
pub type OverrideRecords = (Option<AppliedOverrides>, Option<AppliedOverrides>);

/// Applies override policies to a workload destined for one cluster.
#[async_trait]
pub trait OverrideManager: Send + Sync {
    /// Mutate `workload` in place for `cluster` and report what was applied.
    async fn apply_override_policies(
        &self,
        workload: &mut Workload,
        cluster: &str,
    ) -> Result<OverrideRecords, OverrideError>;
}

/// Override manager that applies nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

#[async_trait]
impl OverrideManager for NoOverrides {
    async fn apply_override_policies(
        &self,
        _workload: &mut Workload,
        _cluster: &str,
    ) -> Result<OverrideRecords, OverrideError> {
        Ok((None, None))
    }
}

/// A label override bound to a fixed set of clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticOverride {
    pub policy_name: String,

    /// Cluster-wide policies are recorded on the cluster channel.
    #[serde(default)]
    pub cluster_wide: bool,

    /// Clusters the override applies to; empty means all.
    #[serde(default)]
    pub cluster_names: Vec<String>,

    pub labels: LabelSet,
}

impl StaticOverride {
    fn applies_to(&self, cluster: &str) -> bool {
        self.cluster_names.is_empty() || self.cluster_names.iter().any(|c| c == cluster)
    }
}

/// Override manager that merges fixed labels per cluster.
#[derive(Debug, Clone, Default)]
pub struct StaticOverrides {
    overrides: Vec<StaticOverride>,
}

impl StaticOverrides {
    pub fn new(overrides: Vec<StaticOverride>) -> Self {
        Self { overrides }
    }
}

#[async_trait]
impl OverrideManager for StaticOverrides {
    async fn apply_override_policies(
        &self,
        workload: &mut Workload,
        cluster: &str,
    ) -> Result<OverrideRecords, OverrideError> {
        let mut cluster_applied = AppliedOverrides::new();
        let mut namespace_applied = AppliedOverrides::new();

        for policy in self.overrides.iter().filter(|o| o.applies_to(cluster)) {
            for (key, value) in &policy.labels {
                workload.merge_label(key, value)?;
            }
            let record = serde_json::json!({ "labels": policy.labels });
            if policy.cluster_wide {
                cluster_applied.push(policy.policy_name.clone(), record);
            } else {
                namespace_applied.push(policy.policy_name.clone(), record);
            }
        }

        let non_empty = |applied: AppliedOverrides| (!applied.is_empty()).then_some(applied);
        Ok((non_empty(cluster_applied), non_empty(namespace_applied)))
    }
}

/// Annotations recording applied overrides.
///
/// Each channel is independent; an absent or empty record leaves its key
/// out instead of writing an empty value.
pub fn record_applied_overrides(
    cluster: Option<&AppliedOverrides>,
    namespaced: Option<&AppliedOverrides>,
) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let mut annotations = BTreeMap::new();

    if let Some(value) = cluster.map(AppliedOverrides::to_annotation).transpose()?.flatten() {
        annotations.insert(APPLIED_CLUSTER_OVERRIDES_ANNOTATION.to_string(), value);
    }
    if let Some(value) = namespaced.map(AppliedOverrides::to_annotation).transpose()?.flatten() {
        annotations.insert(APPLIED_OVERRIDES_ANNOTATION.to_string(), value);
    }

    Ok(annotations)
}
