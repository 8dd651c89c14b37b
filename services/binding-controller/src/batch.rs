//! Label-selector lookups and bulk work deletion.

use fanout_api::{ClusterResourceBinding, LabelSet, ResourceBinding, Work};
use tracing::{error, info};

use crate::error::{ControllerResult, ErrorAggregate};
use crate::store::Store;

/// Whether the caller should retry later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requeue {
    #[default]
    No,
    Yes,
}

impl Requeue {
    pub fn is_requested(self) -> bool {
        self == Requeue::Yes
    }
}

/// Works matching the label selector.
pub async fn get_works(store: &dyn Store, selector: &LabelSet) -> ControllerResult<Vec<Work>> {
    Ok(store.list_works(selector).await?)
}

/// Resource bindings matching the label selector.
pub async fn get_resource_bindings(
    store: &dyn Store,
    selector: &LabelSet,
) -> ControllerResult<Vec<ResourceBinding>> {
    Ok(store.list_resource_bindings(selector).await?)
}

/// Cluster resource bindings matching the label selector.
pub async fn get_cluster_resource_bindings(
    store: &dyn Store,
    selector: &LabelSet,
) -> ControllerResult<Vec<ClusterResourceBinding>> {
    Ok(store.list_cluster_resource_bindings(selector).await?)
}

/// Delete every work matching the label selector.
///
/// All deletions are attempted even when some fail; the failures come back
/// as one aggregate error together with [`Requeue::Yes`]. Matching nothing
/// is a success.
pub async fn delete_works(store: &dyn Store, selector: &LabelSet) -> (Requeue, ControllerResult<()>) {
    let works = match get_works(store, selector).await {
        Ok(works) => works,
        Err(e) => {
            error!(selector = ?selector, error = %e, "Failed to get works by label");
            return (Requeue::Yes, Err(e));
        }
    };

    let mut errs = ErrorAggregate::new();
    for work in &works {
        match store
            .delete_work(&work.metadata.namespace, &work.metadata.name)
            .await
        {
            Ok(()) => info!(work = %work.metadata.key(), "Deleted work"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                error!(work = %work.metadata.key(), error = %e, "Failed to delete work");
                errs.push(e);
            }
        }
    }

    if errs.is_empty() {
        (Requeue::No, Ok(()))
    } else {
        (Requeue::Yes, errs.into_result())
    }
}
