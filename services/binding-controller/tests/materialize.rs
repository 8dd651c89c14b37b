//! Integration tests for work materialization.
//!
//! Each test seeds a [`MemoryStore`], runs `ensure_work` for a binding and
//! inspects the works that land in the execution spaces.

use std::collections::BTreeMap;

use fanout_api::constants::{
    APPLIED_CLUSTER_OVERRIDES_ANNOTATION, APPLIED_OVERRIDES_ANNOTATION,
    CLUSTER_RESOURCE_BINDING_LABEL, EXECUTION_CONTROLLER_FINALIZER, REPLICAS_PATH,
    RESOURCE_BINDING_NAMESPACE_LABEL, RESOURCE_BINDING_NAME_LABEL, WORK_NAMESPACE_LABEL,
    WORK_NAME_LABEL,
};
use fanout_api::{Binding, Work, Workload};
use fanout_binding_controller::materializer::{ensure_work, MaterializeOptions};
use fanout_binding_controller::overrides::{NoOverrides, StaticOverride, StaticOverrides};
use fanout_binding_controller::store::MemoryStore;
use fanout_binding_controller::ControllerError;
use fanout_names::{execution_space_name, work_name};
use fanout_testing::{
    cluster, cluster_resource_binding, cluster_role, deployment, label_set, resource_binding,
    weight_policy,
};

async fn seeded_store(workload: &Workload) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_workload(workload.clone()).await;
    for name in ["A", "B", "C"] {
        store.insert_cluster(cluster(name, &[])).await;
    }
    store
}

async fn ensure(store: &MemoryStore, binding: &Binding, workload: &Workload) {
    ensure_work(
        store,
        &NoOverrides,
        &MaterializeOptions::default(),
        binding,
        workload,
    )
    .await
    .unwrap();
}

/// Replica count of the single manifest in each work, keyed by cluster.
async fn replicas_by_cluster(store: &MemoryStore) -> BTreeMap<String, Option<i64>> {
    store
        .works()
        .await
        .iter()
        .map(|work| {
            let cluster = fanout_names::cluster_name_from_execution_space(&work.metadata.namespace)
                .unwrap();
            (cluster, manifest(work).nested_i64(&REPLICAS_PATH).unwrap())
        })
        .collect()
}

fn manifest(work: &Work) -> &Workload {
    &work.spec.workload.manifests[0]
}

#[tokio::test]
async fn test_work_identity_and_labels() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    let binding = resource_binding(&workload, &[("A", 0)]);

    ensure(&store, &binding, &workload).await;

    let works = store.works().await;
    assert_eq!(works.len(), 1);
    let work = &works[0];

    let expected_space = execution_space_name("A").unwrap();
    let expected_name = work_name("Deployment", "web", "prod").unwrap();
    assert_eq!(work.metadata.namespace, expected_space);
    assert_eq!(work.metadata.name, expected_name);
    assert_eq!(
        work.metadata.labels,
        label_set(&[
            (RESOURCE_BINDING_NAMESPACE_LABEL, "prod"),
            (RESOURCE_BINDING_NAME_LABEL, "web-deployment"),
        ])
    );
    assert_eq!(
        work.metadata.finalizers,
        vec![EXECUTION_CONTROLLER_FINALIZER.to_string()]
    );
    assert!(work.metadata.annotations.is_empty());

    let labels = manifest(work).labels();
    assert_eq!(labels.get("app").map(String::as_str), Some("web"));
    assert_eq!(labels.get(WORK_NAMESPACE_LABEL), Some(&expected_space));
    assert_eq!(labels.get(WORK_NAME_LABEL), Some(&expected_name));
    assert_eq!(
        labels.get(RESOURCE_BINDING_NAME_LABEL).map(String::as_str),
        Some("web-deployment")
    );
}

#[tokio::test]
async fn test_no_policy_keeps_replicas() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0)]);

    ensure(&store, &binding, &workload).await;

    let expected: BTreeMap<_, _> = [("A".to_string(), Some(3)), ("B".to_string(), Some(3))].into();
    assert_eq!(replicas_by_cluster(&store).await, expected);
}

#[tokio::test]
async fn test_policy_splits_replicas() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("prod", "even", 10, &[("A", 1), ("B", 1), ("C", 1)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0), ("C", 0)]);

    ensure(&store, &binding, &workload).await;

    let expected: BTreeMap<_, _> = [
        ("A".to_string(), Some(4)),
        ("B".to_string(), Some(3)),
        ("C".to_string(), Some(3)),
    ]
    .into();
    assert_eq!(replicas_by_cluster(&store).await, expected);
}

#[tokio::test]
async fn test_first_policy_by_name_wins() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("prod", "b-policy", 6, &[("A", 1), ("B", 1)]))
        .await;
    store
        .insert_policy(weight_policy("prod", "a-policy", 6, &[("A", 2)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0)]);

    ensure(&store, &binding, &workload).await;

    let expected: BTreeMap<_, _> = [("A".to_string(), Some(6)), ("B".to_string(), Some(0))].into();
    assert_eq!(replicas_by_cluster(&store).await, expected);
}

#[tokio::test]
async fn test_policy_in_other_namespace_is_ignored() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("staging", "all-a", 10, &[("A", 1)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0)]);

    ensure(&store, &binding, &workload).await;

    let expected: BTreeMap<_, _> = [("A".to_string(), Some(3)), ("B".to_string(), Some(3))].into();
    assert_eq!(replicas_by_cluster(&store).await, expected);
}

#[tokio::test]
async fn test_scheduled_replicas_win_over_policy() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("prod", "even", 10, &[("A", 1), ("B", 1)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 2), ("B", 5)]);

    ensure(&store, &binding, &workload).await;

    let expected: BTreeMap<_, _> = [("A".to_string(), Some(2)), ("B".to_string(), Some(5))].into();
    assert_eq!(replicas_by_cluster(&store).await, expected);
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("prod", "even", 10, &[("A", 1), ("B", 1)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0)]);

    ensure(&store, &binding, &workload).await;
    let writes = store.write_count();
    let before = store.works().await;

    ensure(&store, &binding, &workload).await;
    assert_eq!(store.write_count(), writes);
    assert_eq!(store.works().await, before);
}

#[tokio::test]
async fn test_changed_workload_updates_work() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    let binding = resource_binding(&workload, &[("A", 0)]);
    ensure(&store, &binding, &workload).await;
    let created = store.works().await.remove(0);

    let scaled = deployment("prod", "web", 7);
    store.insert_workload(scaled.clone()).await;
    ensure(&store, &binding, &scaled).await;

    let updated = store.works().await.remove(0);
    assert_eq!(updated.metadata.uid, created.metadata.uid);
    assert_ne!(
        updated.metadata.resource_version,
        created.metadata.resource_version
    );
    assert_eq!(manifest(&updated).nested_i64(&REPLICAS_PATH).unwrap(), Some(7));
}

#[tokio::test]
async fn test_cluster_scoped_binding() {
    let workload = cluster_role("reader");
    let store = seeded_store(&workload).await;
    let binding = cluster_resource_binding(&workload, &[("A", 0)]);

    ensure(&store, &binding, &workload).await;

    let works = store.works().await;
    assert_eq!(works.len(), 1);
    assert_eq!(
        works[0].metadata.name,
        work_name("ClusterRole", "reader", "").unwrap()
    );
    assert_eq!(
        works[0].metadata.labels,
        label_set(&[(CLUSTER_RESOURCE_BINDING_LABEL, "reader-clusterrole")])
    );
    assert!(manifest(&works[0]).nested(&REPLICAS_PATH).is_none());
}

#[tokio::test]
async fn test_overrides_are_applied_and_recorded() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0)]);
    let overrides = StaticOverrides::new(vec![
        StaticOverride {
            policy_name: "region".to_string(),
            cluster_wide: true,
            cluster_names: vec!["A".to_string()],
            labels: label_set(&[("region", "eu")]),
        },
        StaticOverride {
            policy_name: "team".to_string(),
            cluster_wide: false,
            cluster_names: vec![],
            labels: label_set(&[("team", "web")]),
        },
    ]);

    ensure_work(
        &store,
        &overrides,
        &MaterializeOptions::default(),
        &binding,
        &workload,
    )
    .await
    .unwrap();

    let works: BTreeMap<_, _> = store
        .works()
        .await
        .into_iter()
        .map(|w| (w.metadata.namespace.clone(), w))
        .collect();

    let in_a = &works[&execution_space_name("A").unwrap()];
    assert_eq!(
        manifest(in_a).labels().get("region").map(String::as_str),
        Some("eu")
    );
    assert!(in_a
        .metadata
        .annotations
        .contains_key(APPLIED_CLUSTER_OVERRIDES_ANNOTATION));
    assert!(in_a
        .metadata
        .annotations
        .contains_key(APPLIED_OVERRIDES_ANNOTATION));

    let in_b = &works[&execution_space_name("B").unwrap()];
    assert!(!manifest(in_b).labels().contains_key("region"));
    assert!(!in_b
        .metadata
        .annotations
        .contains_key(APPLIED_CLUSTER_OVERRIDES_ANNOTATION));
    let recorded: serde_json::Value =
        serde_json::from_str(&in_b.metadata.annotations[APPLIED_OVERRIDES_ANNOTATION]).unwrap();
    assert_eq!(recorded[0]["policyName"], "team");
}

#[tokio::test]
async fn test_failure_aborts_remaining_clusters() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .fail_writes_in(&execution_space_name("B").unwrap())
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("B", 0), ("C", 0)]);

    let err = ensure_work(
        &store,
        &NoOverrides,
        &MaterializeOptions::default(),
        &binding,
        &workload,
    )
    .await
    .unwrap_err();

    match err {
        ControllerError::EnsureWork { cluster, .. } => assert_eq!(cluster, "B"),
        other => panic!("unexpected error: {other}"),
    }

    let spaces: Vec<String> = store
        .works()
        .await
        .into_iter()
        .map(|w| w.metadata.namespace)
        .collect();
    assert_eq!(spaces, vec![execution_space_name("A").unwrap()]);
}

#[tokio::test]
async fn test_invalid_cluster_name_fails() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    let binding = resource_binding(&workload, &[("", 0)]);

    let err = ensure_work(
        &store,
        &NoOverrides,
        &MaterializeOptions::default(),
        &binding,
        &workload,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ControllerError::EnsureWork { .. }));
    assert!(store.works().await.is_empty());
}

#[tokio::test]
async fn test_missing_cluster_reports_binding_context() {
    let workload = deployment("prod", "web", 3);
    let store = seeded_store(&workload).await;
    store
        .insert_policy(weight_policy("prod", "even", 10, &[("A", 1), ("D", 1)]))
        .await;
    let binding = resource_binding(&workload, &[("A", 0), ("D", 0)]);

    let err = ensure_work(
        &store,
        &NoOverrides,
        &MaterializeOptions::default(),
        &binding,
        &workload,
    )
    .await
    .unwrap_err();

    match &err {
        ControllerError::DesiredReplicas {
            binding, workload, ..
        } => {
            assert_eq!(binding, "prod/web-deployment");
            assert_eq!(workload, "Deployment prod/web");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("cluster D not found"));
    assert!(store.works().await.is_empty());
}
