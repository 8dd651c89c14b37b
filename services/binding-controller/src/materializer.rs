//! Work materialization.
//!
//! For every target cluster of a binding the materializer:
//! - Clones the workload and applies that cluster's override policies
//! - Stamps work identity and binding ownership labels onto the clone
//! - Rewrites `spec.replicas` when the kind scales and a count is known
//! - Creates the work, or updates it when it differs from the stored one
//!
//! The first failing cluster aborts the pass. Clusters already written
//! stay written; create-or-update makes the retry converge.

use std::collections::{BTreeMap, BTreeSet};

use fanout_api::constants::{
    DEPLOYMENT_KIND, EXECUTION_CONTROLLER_FINALIZER, REPLICAS_PATH, WORK_NAMESPACE_LABEL,
    WORK_NAME_LABEL,
};
use fanout_api::{
    has_scheduled_replica, Binding, LabelSet, ManifestError, ObjectMeta, TargetCluster, Work,
    Workload,
};
use fanout_names::{execution_space_name, work_name};
use fanout_reconcile::{allocate_replicas, match_policy};
use tracing::{debug, error, info, instrument};

use crate::error::{ControllerError, ControllerResult};
use crate::overrides::{record_applied_overrides, OverrideManager};
use crate::store::Store;

/// Knobs for materialization.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Workload kinds whose `spec.replicas` may be rewritten.
    pub replica_kinds: BTreeSet<String>,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            replica_kinds: BTreeSet::from([DEPLOYMENT_KIND.to_string()]),
        }
    }
}

impl MaterializeOptions {
    /// Returns true if replicas of this kind may be rewritten.
    pub fn scales(&self, kind: &str) -> bool {
        self.replica_kinds.contains(kind)
    }
}

/// What create-or-update did to a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOperation {
    Created,
    Updated,
    Unchanged,
}

/// Ensure one work per target cluster of `binding` exists and is current.
#[instrument(skip_all, fields(binding = %binding.key(), workload = %workload.reference()))]
pub async fn ensure_work(
    store: &dyn Store,
    overrides: &dyn OverrideManager,
    options: &MaterializeOptions,
    binding: &Binding,
    workload: &Workload,
) -> ControllerResult<()> {
    let targets = binding.target_clusters();
    let desired = desired_replicas(store, options, workload, targets)
        .await
        .map_err(|source| {
            error!(error = %source, "Failed to determine desired replicas");
            ControllerError::DesiredReplicas {
                binding: binding.key().to_string(),
                workload: workload.reference().to_string(),
                source: Box::new(source),
            }
        })?;

    for target in targets {
        ensure_cluster_work(store, overrides, options, binding, workload, target, desired.as_ref())
            .await
            .map_err(|source| {
                error!(cluster = %target.name, error = %source, "Failed to ensure work");
                ControllerError::EnsureWork {
                    binding: binding.key().to_string(),
                    cluster: target.name.clone(),
                    workload: workload.reference().to_string(),
                    source: Box::new(source),
                }
            })?;
    }

    Ok(())
}

/// Replica count per cluster, or `None` when replicas are left alone.
///
/// Counts assigned by the scheduler win. Otherwise scalable kinds consult
/// the replica scheduling policies of the workload's namespace.
pub async fn desired_replicas(
    store: &dyn Store,
    options: &MaterializeOptions,
    workload: &Workload,
    targets: &[TargetCluster],
) -> ControllerResult<Option<BTreeMap<String, i64>>> {
    if has_scheduled_replica(targets) {
        return Ok(Some(
            targets
                .iter()
                .map(|t| (t.name.clone(), i64::from(t.replicas)))
                .collect(),
        ));
    }

    if !options.scales(workload.kind()) {
        return Ok(None);
    }

    let policies = store
        .list_replica_scheduling_policies(workload.namespace())
        .await?;
    let Some(policy) = match_policy(workload, &policies) else {
        debug!("No replica scheduling policy matched");
        return Ok(None);
    };

    let mut clusters = Vec::with_capacity(targets.len());
    for target in targets {
        clusters.push(store.get_cluster(&target.name).await?);
    }

    let allocation = allocate_replicas(policy.spec.total_replicas, &clusters, policy.weight_table());
    debug!(
        policy = %policy.metadata.key(),
        allocation = ?allocation,
        "Desired replicas from replica scheduling policy"
    );
    Ok(Some(allocation))
}

async fn ensure_cluster_work(
    store: &dyn Store,
    overrides: &dyn OverrideManager,
    options: &MaterializeOptions,
    binding: &Binding,
    workload: &Workload,
    target: &TargetCluster,
    desired: Option<&BTreeMap<String, i64>>,
) -> ControllerResult<()> {
    let mut cloned = workload.clone();
    let (cluster_overrides, namespace_overrides) = overrides
        .apply_override_policies(&mut cloned, &target.name)
        .await
        .map_err(|source| ControllerError::Override {
            cluster: target.name.clone(),
            source,
        })?;

    let work_namespace = execution_space_name(&target.name)?;
    let name = work_name(cloned.kind(), cloned.name(), cloned.namespace())?;
    let labels = merge_work_labels(&mut cloned, &work_namespace, &name, binding)?;

    if let Some(desired) = desired.filter(|_| options.scales(cloned.kind())) {
        let replicas = desired.get(&target.name).copied().unwrap_or(0);
        if !apply_desired_replicas(&mut cloned, replicas)? {
            debug!(cluster = %target.name, "Workload has no spec.replicas, leaving it as is");
        }
    }

    let annotations =
        record_applied_overrides(cluster_overrides.as_ref(), namespace_overrides.as_ref())?;

    let metadata = ObjectMeta {
        name,
        namespace: work_namespace,
        labels,
        annotations,
        finalizers: vec![EXECUTION_CONTROLLER_FINALIZER.to_string()],
        ..Default::default()
    };

    let operation = create_or_update_work(store, Work::new(metadata, cloned)).await?;
    if operation != WorkOperation::Unchanged {
        info!(cluster = %target.name, operation = ?operation, "Work synced");
    }
    Ok(())
}

/// Stamp identity and ownership labels onto the workload.
///
/// Returns the labels of the work itself: the binding's ownership labels.
fn merge_work_labels(
    workload: &mut Workload,
    work_namespace: &str,
    work_name: &str,
    binding: &Binding,
) -> Result<LabelSet, ManifestError> {
    workload.merge_label(WORK_NAMESPACE_LABEL, work_namespace)?;
    workload.merge_label(WORK_NAME_LABEL, work_name)?;

    let ownership = binding.ownership_labels();
    for (key, value) in &ownership {
        workload.merge_label(key, value)?;
    }
    Ok(ownership)
}

/// Rewrite `spec.replicas` if the manifest has it.
///
/// A manifest without the field is left untouched and `false` is returned.
/// A field holding something other than an integer is an error.
pub fn apply_desired_replicas(workload: &mut Workload, replicas: i64) -> Result<bool, ManifestError> {
    if workload.nested_i64(&REPLICAS_PATH)?.is_none() {
        return Ok(false);
    }
    workload.set_nested_field(&REPLICAS_PATH, replicas.into())?;
    Ok(true)
}

/// Create the work, or bring the stored one in line with it.
///
/// An update replaces the manifest, labels and annotations and adds the
/// finalizer, keeping store-managed metadata. Nothing is written when the
/// stored work already matches.
pub async fn create_or_update_work(store: &dyn Store, desired: Work) -> ControllerResult<WorkOperation> {
    let existing = match store
        .get_work(&desired.metadata.namespace, &desired.metadata.name)
        .await
    {
        Ok(existing) => existing,
        Err(err) if err.is_not_found() => {
            store.create_work(desired).await?;
            return Ok(WorkOperation::Created);
        }
        Err(err) => return Err(err.into()),
    };

    let mut updated = existing.clone();
    updated.spec = desired.spec;
    updated.metadata.labels = desired.metadata.labels;
    updated.metadata.annotations = desired.metadata.annotations;
    for finalizer in desired.metadata.finalizers {
        if !updated.metadata.finalizers.contains(&finalizer) {
            updated.metadata.finalizers.push(finalizer);
        }
    }

    if updated == existing {
        return Ok(WorkOperation::Unchanged);
    }

    store.update_work(updated).await?;
    Ok(WorkOperation::Updated)
}
