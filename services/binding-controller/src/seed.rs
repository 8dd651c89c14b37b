//! Initial store contents for a standalone controller.

use std::path::Path;

use anyhow::{Context, Result};
use fanout_api::{Binding, BindingKey, Cluster, ReplicaSchedulingPolicy, Workload};
use serde::Deserialize;
use tracing::info;

use crate::overrides::{StaticOverride, StaticOverrides};
use crate::store::MemoryStore;

/// Objects loaded into a [`MemoryStore`] at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub clusters: Vec<Cluster>,
    pub policies: Vec<ReplicaSchedulingPolicy>,
    pub workloads: Vec<Workload>,
    pub bindings: Vec<Binding>,
    pub overrides: Vec<StaticOverride>,
}

impl Seed {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse seed file {}", path.display()))
    }

    /// Insert everything into `store` and return the seeded binding keys.
    pub async fn load(&self, store: &MemoryStore) -> Vec<BindingKey> {
        for cluster in &self.clusters {
            store.insert_cluster(cluster.clone()).await;
        }
        for policy in &self.policies {
            store.insert_policy(policy.clone()).await;
        }
        for workload in &self.workloads {
            store.insert_workload(workload.clone()).await;
        }

        let mut keys = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            keys.push(binding.key());
            store.upsert_binding(binding.clone()).await;
        }

        info!(
            clusters = self.clusters.len(),
            policies = self.policies.len(),
            workloads = self.workloads.len(),
            bindings = self.bindings.len(),
            "Seeded store"
        );

        keys
    }

    pub fn override_manager(&self) -> StaticOverrides {
        StaticOverrides::new(self.overrides.clone())
    }
}
