//! Access to the resource store.
//!
//! The store is the single source of truth. Every call is one synchronous
//! round-trip; writes carry the resource version they were based on and
//! the store rejects stale ones.

mod error;
mod memory;

use async_trait::async_trait;
use fanout_api::{
    Binding, BindingKey, Cluster, ClusterResourceBinding, LabelSet, ObjectReference,
    ReplicaSchedulingPolicy, ResourceBinding, Work, Workload,
};

pub use error::StoreError;
pub use memory::MemoryStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to bindings, workloads, policies, clusters and works.
///
/// List operations accept equality label selectors only; an empty selector
/// matches everything.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch the workload a binding references.
    async fn get_workload(&self, reference: &ObjectReference) -> StoreResult<Workload>;

    /// Fetch a member cluster by name.
    async fn get_cluster(&self, name: &str) -> StoreResult<Cluster>;

    /// List replica scheduling policies in a namespace.
    async fn list_replica_scheduling_policies(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<ReplicaSchedulingPolicy>>;

    /// Fetch a binding of either scope.
    async fn get_binding(&self, key: &BindingKey) -> StoreResult<Binding>;

    async fn list_resource_bindings(&self, selector: &LabelSet) -> StoreResult<Vec<ResourceBinding>>;

    async fn list_cluster_resource_bindings(
        &self,
        selector: &LabelSet,
    ) -> StoreResult<Vec<ClusterResourceBinding>>;

    async fn get_work(&self, namespace: &str, name: &str) -> StoreResult<Work>;

    async fn list_works(&self, selector: &LabelSet) -> StoreResult<Vec<Work>>;

    /// Create a work. Fails with `AlreadyExists` if the identity is taken.
    async fn create_work(&self, work: Work) -> StoreResult<Work>;

    /// Replace a work. Fails with `Conflict` if its resource version is stale.
    async fn update_work(&self, work: Work) -> StoreResult<Work>;

    async fn delete_work(&self, namespace: &str, name: &str) -> StoreResult<()>;
}
