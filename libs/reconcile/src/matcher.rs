//! Replica scheduling policy selection.

use fanout_api::{resource_matches_selectors, ReplicaSchedulingPolicy, Workload};

/// Policies with at least one resource selector matching the workload,
/// sorted by name (then namespace).
pub fn matching_policies<'a>(
    workload: &Workload,
    policies: &'a [ReplicaSchedulingPolicy],
) -> Vec<&'a ReplicaSchedulingPolicy> {
    let mut matches: Vec<_> = policies
        .iter()
        .filter(|policy| resource_matches_selectors(workload, &policy.spec.resource_selectors))
        .collect();
    matches.sort_by(|a, b| {
        a.metadata
            .name
            .cmp(&b.metadata.name)
            .then_with(|| a.metadata.namespace.cmp(&b.metadata.namespace))
    });
    matches
}

/// The policy governing the workload: the matching one with the smallest name.
pub fn match_policy<'a>(
    workload: &Workload,
    policies: &'a [ReplicaSchedulingPolicy],
) -> Option<&'a ReplicaSchedulingPolicy> {
    matching_policies(workload, policies).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_api::{ObjectMeta, ReplicaSchedulingSpec, ResourceSelector};
    use serde_json::json;

    fn nginx() -> Workload {
        Workload::new(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "nginx", "namespace": "default"}
        }))
    }

    fn policy(name: &str, kind: &str) -> ReplicaSchedulingPolicy {
        ReplicaSchedulingPolicy {
            metadata: ObjectMeta::new(name, "default"),
            spec: ReplicaSchedulingSpec {
                resource_selectors: vec![ResourceSelector {
                    api_version: "apps/v1".to_string(),
                    kind: kind.to_string(),
                    ..Default::default()
                }],
                total_replicas: 3,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_no_policies() {
        assert!(match_policy(&nginx(), &[]).is_none());
    }

    #[test]
    fn test_no_matching_policy() {
        let policies = vec![policy("a", "StatefulSet")];
        assert!(match_policy(&nginx(), &policies).is_none());
    }

    #[test]
    fn test_smallest_name_wins_regardless_of_order() {
        let mut policies = vec![
            policy("zeta", "Deployment"),
            policy("alpha", "Deployment"),
            policy("aardvark", "StatefulSet"),
            policy("beta", "Deployment"),
        ];
        assert_eq!(match_policy(&nginx(), &policies).map(|p| p.name()), Some("alpha"));

        policies.reverse();
        assert_eq!(match_policy(&nginx(), &policies).map(|p| p.name()), Some("alpha"));

        let names: Vec<_> = matching_policies(&nginx(), &policies)
            .into_iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_policy_without_selectors_never_matches() {
        let mut empty = policy("a", "Deployment");
        empty.spec.resource_selectors.clear();
        assert!(match_policy(&nginx(), &[empty]).is_none());
    }
}
