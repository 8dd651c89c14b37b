//! In-process store.
//!
//! Backs tests and the dev binary. It behaves like the real store where the
//! controller can observe it: store-managed metadata, optimistic
//! concurrency on updates, and equality label selectors. Faults can be
//! injected per work to exercise partial-failure paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use fanout_api::{
    labels_match, Binding, BindingKey, Cluster, ClusterResourceBinding, LabelSet, ObjectReference,
    ReplicaSchedulingPolicy, ResourceBinding, Work, Workload,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};

type NamespacedKey = (String, String);

#[derive(Debug, Default)]
struct State {
    workloads: BTreeMap<ObjectKey, Workload>,
    clusters: BTreeMap<String, Cluster>,
    policies: BTreeMap<NamespacedKey, ReplicaSchedulingPolicy>,
    resource_bindings: BTreeMap<NamespacedKey, ResourceBinding>,
    cluster_resource_bindings: BTreeMap<String, ClusterResourceBinding>,
    works: BTreeMap<NamespacedKey, Work>,
    failing_deletes: BTreeSet<NamespacedKey>,
    failing_writes: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    api_version: String,
    kind: String,
    namespace: String,
    name: String,
}

impl From<&ObjectReference> for ObjectKey {
    fn from(r: &ObjectReference) -> Self {
        Self {
            api_version: r.api_version.clone(),
            kind: r.kind.clone(),
            namespace: r.namespace.clone(),
            name: r.name.clone(),
        }
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,

    /// Successful work writes (create, update, delete).
    writes: AtomicU64,

    /// Counter for resource versions.
    revision: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_workload(&self, workload: Workload) {
        let key = ObjectKey::from(&workload.reference());
        self.state.write().await.workloads.insert(key, workload);
    }

    pub async fn insert_cluster(&self, cluster: Cluster) {
        self.state
            .write()
            .await
            .clusters
            .insert(cluster.name().to_string(), cluster);
    }

    pub async fn insert_policy(&self, policy: ReplicaSchedulingPolicy) {
        let key = (policy.metadata.namespace.clone(), policy.metadata.name.clone());
        self.state.write().await.policies.insert(key, policy);
    }

    /// Insert or replace a binding.
    pub async fn upsert_binding(&self, binding: Binding) {
        let mut state = self.state.write().await;
        match binding {
            Binding::Namespaced(rb) => {
                let key = (rb.metadata.namespace.clone(), rb.metadata.name.clone());
                state.resource_bindings.insert(key, rb);
            }
            Binding::Cluster(crb) => {
                state
                    .cluster_resource_bindings
                    .insert(crb.metadata.name.clone(), crb);
            }
        }
    }

    pub async fn remove_binding(&self, key: &BindingKey) {
        let mut state = self.state.write().await;
        match key {
            BindingKey::Namespaced { namespace, name } => {
                state
                    .resource_bindings
                    .remove(&(namespace.clone(), name.clone()));
            }
            BindingKey::Cluster { name } => {
                state.cluster_resource_bindings.remove(name);
            }
        }
    }

    /// Snapshot of all works, ordered by namespace then name.
    pub async fn works(&self) -> Vec<Work> {
        self.state.read().await.works.values().cloned().collect()
    }

    /// Number of successful work writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make deleting one work fail until cleared.
    pub async fn fail_delete(&self, namespace: &str, name: &str) {
        self.state
            .write()
            .await
            .failing_deletes
            .insert((namespace.to_string(), name.to_string()));
    }

    /// Make creating or updating works in a namespace fail until cleared.
    pub async fn fail_writes_in(&self, namespace: &str) {
        self.state
            .write()
            .await
            .failing_writes
            .insert(namespace.to_string());
    }

    pub async fn clear_faults(&self) {
        let mut state = self.state.write().await;
        state.failing_deletes.clear();
        state.failing_writes.clear();
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn work_key(work: &Work) -> NamespacedKey {
    (work.metadata.namespace.clone(), work.metadata.name.clone())
}

fn display_key((namespace, name): &NamespacedKey) -> String {
    format!("{namespace}/{name}")
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_workload(&self, reference: &ObjectReference) -> StoreResult<Workload> {
        self.state
            .read()
            .await
            .workloads
            .get(&ObjectKey::from(reference))
            .cloned()
            .ok_or_else(|| StoreError::not_found("workload", reference.to_string()))
    }

    async fn get_cluster(&self, name: &str) -> StoreResult<Cluster> {
        self.state
            .read()
            .await
            .clusters
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("cluster", name))
    }

    async fn list_replica_scheduling_policies(
        &self,
        namespace: &str,
    ) -> StoreResult<Vec<ReplicaSchedulingPolicy>> {
        Ok(self
            .state
            .read()
            .await
            .policies
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, policy)| policy.clone())
            .collect())
    }

    async fn get_binding(&self, key: &BindingKey) -> StoreResult<Binding> {
        let state = self.state.read().await;
        let binding = match key {
            BindingKey::Namespaced { namespace, name } => state
                .resource_bindings
                .get(&(namespace.clone(), name.clone()))
                .cloned()
                .map(Binding::Namespaced),
            BindingKey::Cluster { name } => state
                .cluster_resource_bindings
                .get(name)
                .cloned()
                .map(Binding::Cluster),
        };
        binding.ok_or_else(|| StoreError::not_found("binding", key.to_string()))
    }

    async fn list_resource_bindings(&self, selector: &LabelSet) -> StoreResult<Vec<ResourceBinding>> {
        Ok(self
            .state
            .read()
            .await
            .resource_bindings
            .values()
            .filter(|rb| labels_match(selector, &rb.metadata.labels))
            .cloned()
            .collect())
    }

    async fn list_cluster_resource_bindings(
        &self,
        selector: &LabelSet,
    ) -> StoreResult<Vec<ClusterResourceBinding>> {
        Ok(self
            .state
            .read()
            .await
            .cluster_resource_bindings
            .values()
            .filter(|crb| labels_match(selector, &crb.metadata.labels))
            .cloned()
            .collect())
    }

    async fn get_work(&self, namespace: &str, name: &str) -> StoreResult<Work> {
        let key = (namespace.to_string(), name.to_string());
        self.state
            .read()
            .await
            .works
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("work", display_key(&key)))
    }

    async fn list_works(&self, selector: &LabelSet) -> StoreResult<Vec<Work>> {
        Ok(self
            .state
            .read()
            .await
            .works
            .values()
            .filter(|work| labels_match(selector, &work.metadata.labels))
            .cloned()
            .collect())
    }

    async fn create_work(&self, mut work: Work) -> StoreResult<Work> {
        let key = work_key(&work);
        let mut state = self.state.write().await;
        if state.failing_writes.contains(&key.0) {
            return Err(StoreError::Unavailable(format!(
                "writes to {} are failing",
                key.0
            )));
        }
        if state.works.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: "work",
                key: display_key(&key),
            });
        }

        work.metadata.uid = Some(Uuid::new_v4().to_string());
        work.metadata.resource_version = Some(self.next_revision());
        work.metadata.creation_timestamp = Some(Utc::now());
        state.works.insert(key, work.clone());
        self.record_write();
        Ok(work)
    }

    async fn update_work(&self, mut work: Work) -> StoreResult<Work> {
        let key = work_key(&work);
        let mut state = self.state.write().await;
        if state.failing_writes.contains(&key.0) {
            return Err(StoreError::Unavailable(format!(
                "writes to {} are failing",
                key.0
            )));
        }
        let Some(stored) = state.works.get(&key) else {
            return Err(StoreError::not_found("work", display_key(&key)));
        };
        if stored.metadata.resource_version != work.metadata.resource_version {
            return Err(StoreError::Conflict {
                kind: "work",
                key: display_key(&key),
                expected: work.metadata.resource_version,
            });
        }

        work.metadata.uid = stored.metadata.uid.clone();
        work.metadata.creation_timestamp = stored.metadata.creation_timestamp;
        work.metadata.resource_version = Some(self.next_revision());
        state.works.insert(key, work.clone());
        self.record_write();
        Ok(work)
    }

    async fn delete_work(&self, namespace: &str, name: &str) -> StoreResult<()> {
        let key = (namespace.to_string(), name.to_string());
        let mut state = self.state.write().await;
        if state.failing_deletes.contains(&key) {
            return Err(StoreError::Unavailable(format!(
                "delete of work {} is failing",
                display_key(&key)
            )));
        }
        if state.works.remove(&key).is_none() {
            return Err(StoreError::not_found("work", display_key(&key)));
        }
        self.record_write();
        Ok(())
    }
}
