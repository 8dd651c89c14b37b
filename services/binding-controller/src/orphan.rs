//! Orphan work detection and removal.
//!
//! A work is orphaned when the binding that owns it no longer targets the
//! cluster whose execution space the work lives in.

use std::collections::BTreeSet;

use fanout_api::{Binding, Work};
use fanout_names::cluster_name_from_execution_space;
use tracing::{error, info, instrument};

use crate::error::{ControllerResult, ErrorAggregate};
use crate::store::Store;

/// Works owned by `binding` whose cluster is not in `cluster_names`.
///
/// A work whose namespace is not an execution space fails the whole call.
#[instrument(skip_all, fields(binding = %binding.key()))]
pub async fn find_orphan_works(
    store: &dyn Store,
    binding: &Binding,
    cluster_names: &[String],
) -> ControllerResult<Vec<Work>> {
    let works = store.list_works(&binding.ownership_labels()).await?;
    let expected: BTreeSet<&str> = cluster_names.iter().map(String::as_str).collect();

    let mut orphans = Vec::new();
    for work in works {
        let cluster = cluster_name_from_execution_space(&work.metadata.namespace).map_err(|e| {
            error!(
                work = %work.metadata.key(),
                error = %e,
                "Failed to get cluster name which work belongs to"
            );
            e
        })?;
        if !expected.contains(cluster.as_str()) {
            orphans.push(work);
        }
    }

    Ok(orphans)
}

/// Delete the given works.
///
/// Every deletion is attempted; failures are collected into one aggregate
/// error. A work that is already gone counts as deleted.
pub async fn remove_orphan_works(store: &dyn Store, works: &[Work]) -> ControllerResult<()> {
    let mut errs = ErrorAggregate::new();

    for work in works {
        match store
            .delete_work(&work.metadata.namespace, &work.metadata.name)
            .await
        {
            Ok(()) => info!(work = %work.metadata.key(), "Deleted orphan work"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                error!(work = %work.metadata.key(), error = %e, "Failed to delete orphan work");
                errs.push(e);
            }
        }
    }

    errs.into_result()
}
