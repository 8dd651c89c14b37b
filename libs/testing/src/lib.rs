//! Shared test fixtures.
//!
//! Builders for clusters, workloads, bindings and replica scheduling
//! policies with the defaults most tests want.

use fanout_api::{
    Binding, BindingSpec, Cluster, ClusterAffinity, ClusterPreferences, ClusterResourceBinding,
    LabelSet, ObjectMeta, ObjectReference, ReplicaSchedulingPolicy, ReplicaSchedulingSpec,
    ResourceBinding, ResourceSelector, StaticWeightRule, TargetCluster, WeightTable, Workload,
};
use serde_json::json;

/// Cluster with the given labels.
pub fn cluster(name: &str, labels: &[(&str, &str)]) -> Cluster {
    Cluster::new(name, label_set(labels))
}

pub fn label_set(labels: &[(&str, &str)]) -> LabelSet {
    labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `apps/v1` Deployment with `spec.replicas` set.
pub fn deployment(namespace: &str, name: &str, replicas: i64) -> Workload {
    Workload::new(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": {"app": name}
        },
        "spec": {
            "replicas": replicas,
            "template": {"spec": {"containers": [{"name": name, "image": "nginx"}]}}
        }
    }))
}

/// Cluster-scoped workload without replicas.
pub fn cluster_role(name: &str) -> Workload {
    Workload::new(json!({
        "apiVersion": "rbac.authorization.k8s.io/v1",
        "kind": "ClusterRole",
        "metadata": {"name": name},
        "rules": []
    }))
}

pub fn targets(clusters: &[(&str, i32)]) -> Vec<TargetCluster> {
    clusters
        .iter()
        .map(|(name, replicas)| TargetCluster::new(*name, *replicas))
        .collect()
}

/// Namespaced binding for `workload`, named `{name}-{kind}` in lowercase.
pub fn resource_binding(workload: &Workload, clusters: &[(&str, i32)]) -> Binding {
    ResourceBinding {
        metadata: ObjectMeta::new(binding_name(workload), workload.namespace()),
        spec: BindingSpec {
            resource: workload.reference(),
            clusters: targets(clusters),
        },
    }
    .into()
}

/// Cluster-scoped binding for `workload`.
pub fn cluster_resource_binding(workload: &Workload, clusters: &[(&str, i32)]) -> Binding {
    ClusterResourceBinding {
        metadata: ObjectMeta::new(binding_name(workload), ""),
        spec: BindingSpec {
            resource: workload.reference(),
            clusters: targets(clusters),
        },
    }
    .into()
}

fn binding_name(workload: &Workload) -> String {
    format!("{}-{}", workload.name(), workload.kind()).to_lowercase()
}

/// Replica scheduling policy selecting Deployments in `namespace`, with
/// one static weight per named cluster.
pub fn weight_policy(
    namespace: &str,
    name: &str,
    total_replicas: i32,
    weights: &[(&str, i64)],
) -> ReplicaSchedulingPolicy {
    ReplicaSchedulingPolicy {
        metadata: ObjectMeta::new(name, namespace),
        spec: ReplicaSchedulingSpec {
            resource_selectors: vec![ResourceSelector {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                namespace: namespace.to_string(),
                ..Default::default()
            }],
            total_replicas,
            preferences: ClusterPreferences {
                static_weight_list: weights
                    .iter()
                    .map(|(cluster, weight)| StaticWeightRule {
                        target_cluster: ClusterAffinity::names([*cluster]),
                        weight: *weight,
                    })
                    .collect::<WeightTable>(),
            },
        },
    }
}
