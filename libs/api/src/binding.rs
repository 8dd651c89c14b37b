//! Scheduling decisions.
//!
//! A binding assigns one workload to a set of target clusters. Namespaced
//! and cluster-scoped bindings carry the same spec and differ only in how
//! the works they own are labeled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLUSTER_RESOURCE_BINDING_LABEL, RESOURCE_BINDING_NAMESPACE_LABEL, RESOURCE_BINDING_NAME_LABEL,
};
use crate::{LabelSet, ObjectMeta, ObjectReference};

/// One scheduled cluster.
///
/// `replicas` is 0 when the scheduler left replica sizing to policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCluster {
    pub name: String,
    #[serde(default)]
    pub replicas: i32,
}

impl TargetCluster {
    pub fn new(name: impl Into<String>, replicas: i32) -> Self {
        Self {
            name: name.into(),
            replicas,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub resource: ObjectReference,
    #[serde(default)]
    pub clusters: Vec<TargetCluster>,
}

/// Binding for a namespaced workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub metadata: ObjectMeta,
    pub spec: BindingSpec,
}

/// Binding for a cluster-scoped workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResourceBinding {
    pub metadata: ObjectMeta,
    pub spec: BindingSpec,
}

/// A binding of either scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Binding {
    #[serde(rename = "ResourceBinding")]
    Namespaced(ResourceBinding),
    #[serde(rename = "ClusterResourceBinding")]
    Cluster(ClusterResourceBinding),
}

impl Binding {
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Binding::Namespaced(rb) => &rb.metadata,
            Binding::Cluster(crb) => &crb.metadata,
        }
    }

    fn spec(&self) -> &BindingSpec {
        match self {
            Binding::Namespaced(rb) => &rb.spec,
            Binding::Cluster(crb) => &crb.spec,
        }
    }

    pub fn key(&self) -> BindingKey {
        match self {
            Binding::Namespaced(rb) => BindingKey::Namespaced {
                namespace: rb.metadata.namespace.clone(),
                name: rb.metadata.name.clone(),
            },
            Binding::Cluster(crb) => BindingKey::Cluster {
                name: crb.metadata.name.clone(),
            },
        }
    }

    pub fn resource(&self) -> &ObjectReference {
        &self.spec().resource
    }

    pub fn target_clusters(&self) -> &[TargetCluster] {
        &self.spec().clusters
    }

    /// Labels identifying works owned by this binding.
    pub fn ownership_labels(&self) -> LabelSet {
        self.key().ownership_labels()
    }
}

impl From<ResourceBinding> for Binding {
    fn from(rb: ResourceBinding) -> Self {
        Binding::Namespaced(rb)
    }
}

impl From<ClusterResourceBinding> for Binding {
    fn from(crb: ClusterResourceBinding) -> Self {
        Binding::Cluster(crb)
    }
}

/// Identity of a binding. Enough to find its works after it is gone.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum BindingKey {
    Namespaced { namespace: String, name: String },
    Cluster { name: String },
}

impl BindingKey {
    /// Namespace/name pair for namespaced bindings, single name otherwise.
    pub fn ownership_labels(&self) -> LabelSet {
        match self {
            BindingKey::Namespaced { namespace, name } => LabelSet::from([
                (RESOURCE_BINDING_NAMESPACE_LABEL.to_string(), namespace.clone()),
                (RESOURCE_BINDING_NAME_LABEL.to_string(), name.clone()),
            ]),
            BindingKey::Cluster { name } => {
                LabelSet::from([(CLUSTER_RESOURCE_BINDING_LABEL.to_string(), name.clone())])
            }
        }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Namespaced { namespace, name } => write!(f, "{namespace}/{name}"),
            BindingKey::Cluster { name } => write!(f, "{name}"),
        }
    }
}

/// A binding is ready to build works once it has at least one target.
pub fn is_binding_ready(targets: &[TargetCluster]) -> bool {
    !targets.is_empty()
}

/// True if the scheduler assigned replicas to any target.
pub fn has_scheduled_replica(targets: &[TargetCluster]) -> bool {
    targets.iter().any(|t| t.replicas > 0)
}

pub fn binding_cluster_names(targets: &[TargetCluster]) -> Vec<String> {
    targets.iter().map(|t| t.name.clone()).collect()
}
