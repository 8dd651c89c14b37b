//! Binding reconciler.
//!
//! One reconciliation of a binding:
//! - Skips bindings the scheduler has not placed yet
//! - Fetches the referenced workload
//! - Materializes one work per target cluster
//! - Deletes works left behind in clusters the binding no longer targets
//!
//! A binding that has disappeared from the store is torn down by deleting
//! every work carrying its ownership labels.

use std::sync::Arc;

use fanout_api::{binding_cluster_names, is_binding_ready, Binding, BindingKey, LabelSet};
use tracing::{debug, info, instrument};

use crate::batch::{delete_works, get_cluster_resource_bindings, get_resource_bindings};
use crate::error::ControllerResult;
use crate::materializer::{ensure_work, MaterializeOptions};
use crate::orphan::{find_orphan_works, remove_orphan_works};
use crate::overrides::OverrideManager;
use crate::store::Store;

/// What a single sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The binding has no target clusters yet.
    NotReady,
    /// Works were materialized and orphans removed.
    Synced { clusters: usize, orphans_removed: usize },
    /// The binding is gone and its works were deleted.
    TornDown,
}

/// Statistics from a full resync pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    pub bindings_processed: i32,
    pub bindings_failed: i32,
    pub bindings_not_ready: i32,
    pub orphans_removed: i32,
}

/// Reconciles bindings against the works in the store.
#[derive(Clone)]
pub struct BindingReconciler {
    store: Arc<dyn Store>,
    overrides: Arc<dyn OverrideManager>,
    options: MaterializeOptions,
}

impl BindingReconciler {
    pub fn new(
        store: Arc<dyn Store>,
        overrides: Arc<dyn OverrideManager>,
        options: MaterializeOptions,
    ) -> Self {
        Self {
            store,
            overrides,
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Bring the works of `binding` in line with its target clusters.
    #[instrument(skip_all, fields(binding = %binding.key()))]
    pub async fn reconcile(&self, binding: &Binding) -> ControllerResult<SyncOutcome> {
        let targets = binding.target_clusters();
        if !is_binding_ready(targets) {
            debug!("Binding has no target clusters yet");
            return Ok(SyncOutcome::NotReady);
        }

        let workload = self.store.get_workload(binding.resource()).await?;

        ensure_work(
            self.store.as_ref(),
            self.overrides.as_ref(),
            &self.options,
            binding,
            &workload,
        )
        .await?;

        let cluster_names = binding_cluster_names(targets);
        let orphans = find_orphan_works(self.store.as_ref(), binding, &cluster_names).await?;
        remove_orphan_works(self.store.as_ref(), &orphans).await?;

        Ok(SyncOutcome::Synced {
            clusters: targets.len(),
            orphans_removed: orphans.len(),
        })
    }

    /// Delete every work owned by the binding identified by `key`.
    #[instrument(skip(self))]
    pub async fn teardown(&self, key: &BindingKey) -> ControllerResult<SyncOutcome> {
        let (requeue, result) = delete_works(self.store.as_ref(), &key.ownership_labels()).await;
        if requeue.is_requested() {
            debug!("Teardown incomplete, will retry");
        }
        result?;
        info!("Deleted works of removed binding");
        Ok(SyncOutcome::TornDown)
    }

    /// Re-read the binding and reconcile it, or tear it down if it is gone.
    pub async fn sync(&self, key: &BindingKey) -> ControllerResult<SyncOutcome> {
        match self.store.get_binding(key).await {
            Ok(binding) => self.reconcile(&binding).await,
            Err(e) if e.is_not_found() => self.teardown(key).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Keys of every binding in the store, namespaced first.
    pub async fn binding_keys(&self) -> ControllerResult<Vec<BindingKey>> {
        let all = LabelSet::new();
        let namespaced = get_resource_bindings(self.store.as_ref(), &all).await?;
        let cluster_wide = get_cluster_resource_bindings(self.store.as_ref(), &all).await?;

        Ok(namespaced
            .into_iter()
            .map(Binding::from)
            .chain(cluster_wide.into_iter().map(Binding::from))
            .map(|b| b.key())
            .collect())
    }
}
