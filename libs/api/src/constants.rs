//! Well-known label, annotation and finalizer keys.

/// Namespace of the `ResourceBinding` that owns a work.
pub const RESOURCE_BINDING_NAMESPACE_LABEL: &str = "resourcebinding.fanout.io/namespace";

/// Name of the `ResourceBinding` that owns a work.
pub const RESOURCE_BINDING_NAME_LABEL: &str = "resourcebinding.fanout.io/name";

/// Name of the `ClusterResourceBinding` that owns a work.
pub const CLUSTER_RESOURCE_BINDING_LABEL: &str = "clusterresourcebinding.fanout.io/name";

/// Execution space of the work carrying a workload.
pub const WORK_NAMESPACE_LABEL: &str = "work.fanout.io/namespace";

/// Name of the work carrying a workload.
pub const WORK_NAME_LABEL: &str = "work.fanout.io/name";

/// Cluster-wide override policies applied to a work.
pub const APPLIED_CLUSTER_OVERRIDES_ANNOTATION: &str = "policy.fanout.io/applied-cluster-overrides";

/// Namespaced override policies applied to a work.
pub const APPLIED_OVERRIDES_ANNOTATION: &str = "policy.fanout.io/applied-overrides";

/// Finalizer marking a work as managed by the execution controller.
pub const EXECUTION_CONTROLLER_FINALIZER: &str = "fanout.io/execution-controller";

/// Kind that supports replica rewriting by default.
pub const DEPLOYMENT_KIND: &str = "Deployment";

/// Path of the replica count inside a workload manifest.
pub const REPLICAS_PATH: [&str; 2] = ["spec", "replicas"];
