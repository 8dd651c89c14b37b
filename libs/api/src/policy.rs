//! Replica scheduling policies.

use serde::{Deserialize, Serialize};

use crate::{Cluster, ClusterAffinity, ObjectMeta, ResourceSelector};

/// One weight rule: clusters matched by `target_cluster` get `weight`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticWeightRule {
    pub target_cluster: ClusterAffinity,
    pub weight: i64,
}

/// Ordered weight rules. The first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(Vec<StaticWeightRule>);

impl WeightTable {
    pub fn new(rules: Vec<StaticWeightRule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[StaticWeightRule] {
        &self.0
    }

    /// Weight of the first rule matching the cluster.
    pub fn weight_for(&self, cluster: &Cluster) -> Option<i64> {
        self.0
            .iter()
            .find(|rule| rule.target_cluster.matches(cluster))
            .map(|rule| rule.weight)
    }
}

impl FromIterator<StaticWeightRule> for WeightTable {
    fn from_iter<I: IntoIterator<Item = StaticWeightRule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPreferences {
    #[serde(default)]
    pub static_weight_list: WeightTable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSchedulingSpec {
    pub resource_selectors: Vec<ResourceSelector>,
    pub total_replicas: i32,
    #[serde(default)]
    pub preferences: ClusterPreferences,
}

/// Splits `total_replicas` of matching workloads across clusters by weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSchedulingPolicy {
    pub metadata: ObjectMeta,
    pub spec: ReplicaSchedulingSpec,
}

impl ReplicaSchedulingPolicy {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn weight_table(&self) -> &WeightTable {
        &self.spec.preferences.static_weight_list
    }
}
