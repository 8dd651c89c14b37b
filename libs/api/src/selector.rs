//! Label, resource and cluster selectors.

use serde::{Deserialize, Serialize};

use crate::{Cluster, LabelSet, Workload};

/// Set-based label selector operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One set-based requirement of a label selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl LabelSelectorRequirement {
    pub fn matches(&self, labels: &LabelSet) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            SelectorOperator::In => value.is_some_and(|v| self.values.contains(v)),
            SelectorOperator::NotIn => value.map_or(true, |v| !self.values.contains(v)),
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }
}

/// Label selector. All terms are ANDed; an empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "LabelSet::is_empty")]
    pub match_labels: LabelSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    pub fn matches(&self, labels: &LabelSet) -> bool {
        labels_match(&self.match_labels, labels)
            && self.match_expressions.iter().all(|r| r.matches(labels))
    }
}

/// Equality selector check: every selector pair is present in `labels`.
pub fn labels_match(selector: &LabelSet, labels: &LabelSet) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
}

/// Selects workloads a policy applies to.
///
/// `api_version` and `kind` always have to match and `namespace` when set.
/// A non-empty `name` then decides alone and `label_selector` is ignored;
/// otherwise the label selector decides, and an absent one matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

impl ResourceSelector {
    pub fn matches(&self, workload: &Workload) -> bool {
        if workload.api_version() != self.api_version || workload.kind() != self.kind {
            return false;
        }
        if !self.namespace.is_empty() && workload.namespace() != self.namespace {
            return false;
        }
        if !self.name.is_empty() {
            return workload.name() == self.name;
        }
        self.label_selector
            .as_ref()
            .map_or(true, |selector| selector.matches(&workload.labels()))
    }
}

/// True if at least one selector matches the workload.
pub fn resource_matches_selectors(workload: &Workload, selectors: &[ResourceSelector]) -> bool {
    selectors.iter().any(|selector| selector.matches(workload))
}

/// Selects member clusters. An empty affinity matches every cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAffinity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ClusterAffinity {
    /// Affinity that matches exactly the named clusters.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cluster_names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn matches(&self, cluster: &Cluster) -> bool {
        let name = cluster.name();
        if self.exclude.iter().any(|excluded| excluded == name) {
            return false;
        }
        if let Some(selector) = &self.label_selector {
            if !selector.matches(&cluster.metadata.labels) {
                return false;
            }
        }
        self.cluster_names.is_empty() || self.cluster_names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> LabelSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn nginx() -> Workload {
        Workload::new(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "nginx", "namespace": "default", "labels": {"app": "nginx"}}
        }))
    }

    fn selector(namespace: &str, name: &str, label_selector: Option<LabelSelector>) -> ResourceSelector {
        ResourceSelector {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            label_selector,
        }
    }

    #[rstest]
    #[case::in_present(SelectorOperator::In, &["nginx"], true)]
    #[case::in_other(SelectorOperator::In, &["redis"], false)]
    #[case::not_in_other(SelectorOperator::NotIn, &["redis"], true)]
    #[case::not_in_present(SelectorOperator::NotIn, &["nginx"], false)]
    #[case::exists(SelectorOperator::Exists, &[], true)]
    #[case::does_not_exist(SelectorOperator::DoesNotExist, &[], false)]
    fn test_requirement(
        #[case] operator: SelectorOperator,
        #[case] values: &[&str],
        #[case] expected: bool,
    ) {
        let requirement = LabelSelectorRequirement {
            key: "app".to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        assert_eq!(requirement.matches(&labels(&[("app", "nginx")])), expected);
    }

    #[test]
    fn test_not_in_missing_key_matches() {
        let requirement = LabelSelectorRequirement {
            key: "tier".to_string(),
            operator: SelectorOperator::NotIn,
            values: vec!["web".to_string()],
        };
        assert!(requirement.matches(&LabelSet::new()));
    }

    #[rstest]
    #[case::all_in_kind("", "", None, true)]
    #[case::namespace_match("default", "", None, true)]
    #[case::namespace_mismatch("prod", "", None, false)]
    #[case::name_match("", "nginx", None, true)]
    #[case::name_mismatch("", "redis", None, false)]
    #[case::name_wins_over_labels("", "nginx", Some(LabelSelector { match_labels: labels(&[("app", "redis")]), ..Default::default() }), true)]
    #[case::labels_match("", "", Some(LabelSelector { match_labels: labels(&[("app", "nginx")]), ..Default::default() }), true)]
    #[case::labels_mismatch("", "", Some(LabelSelector { match_labels: labels(&[("app", "redis")]), ..Default::default() }), false)]
    fn test_resource_selector(
        #[case] namespace: &str,
        #[case] name: &str,
        #[case] label_selector: Option<LabelSelector>,
        #[case] expected: bool,
    ) {
        assert_eq!(selector(namespace, name, label_selector).matches(&nginx()), expected);
    }

    #[test]
    fn test_resource_selector_kind_mismatch() {
        let mut selector = selector("", "", None);
        selector.kind = "StatefulSet".to_string();
        assert!(!selector.matches(&nginx()));
        assert!(!resource_matches_selectors(&nginx(), &[selector.clone()]));
        assert!(resource_matches_selectors(&nginx(), &[selector, self::selector("", "", None)]));
    }

    #[test]
    fn test_cluster_affinity() {
        let member1 = Cluster::new("member1", labels(&[("region", "eu")]));
        let member2 = Cluster::new("member2", labels(&[("region", "us")]));

        assert!(ClusterAffinity::default().matches(&member1));
        assert!(ClusterAffinity::names(["member1"]).matches(&member1));
        assert!(!ClusterAffinity::names(["member1"]).matches(&member2));

        let by_region = ClusterAffinity {
            label_selector: Some(LabelSelector {
                match_labels: labels(&[("region", "eu")]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(by_region.matches(&member1));
        assert!(!by_region.matches(&member2));

        let excluded = ClusterAffinity {
            exclude: vec!["member1".to_string()],
            ..Default::default()
        };
        assert!(!excluded.matches(&member1));
        assert!(excluded.matches(&member2));
    }
}
