//! Weighted replica allocation.

use std::collections::BTreeMap;

use fanout_api::{Cluster, WeightTable};

/// A cluster and the weight its first matching rule assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterWeight {
    pub cluster_name: String,
    pub weight: i64,
}

/// Sort clusters by weight descending, then by name ascending.
pub fn sort_by_weight(weights: &BTreeMap<String, i64>) -> Vec<ClusterWeight> {
    let mut sorted: Vec<ClusterWeight> = weights
        .iter()
        .map(|(name, weight)| ClusterWeight {
            cluster_name: name.clone(),
            weight: *weight,
        })
        .collect();
    sorted.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then_with(|| a.cluster_name.cmp(&b.cluster_name))
    });
    sorted
}

/// Split `total_replicas` across `clusters` by the weights in `table`.
///
/// Each cluster takes the weight of the first rule that matches it. Matched
/// clusters receive `floor(weight * total / weight_sum)`; the remaining
/// replicas go one at a time to matched clusters with a positive weight in
/// [`sort_by_weight`] order, wrapping modulo the number of those clusters.
///
/// Every candidate appears in the result. Unmatched clusters get 0, and when
/// nothing matched (or the weight sum is 0) every cluster gets 0. Negative
/// totals and weights count as 0. Duplicate cluster names are counted once.
pub fn allocate_replicas(
    total_replicas: i32,
    clusters: &[Cluster],
    table: &WeightTable,
) -> BTreeMap<String, i64> {
    let total = i128::from(total_replicas.max(0));

    let mut allocation = BTreeMap::new();
    let mut matched = BTreeMap::new();
    for cluster in clusters {
        if allocation.insert(cluster.name().to_string(), 0i64).is_some() {
            continue;
        }
        if let Some(weight) = table.weight_for(cluster) {
            matched.insert(cluster.name().to_string(), weight.max(0));
        }
    }

    let weight_sum: i128 = matched.values().map(|w| i128::from(*w)).sum();
    if weight_sum == 0 {
        return allocation;
    }

    let mut allocated: i128 = 0;
    for (name, weight) in &matched {
        let share = i128::from(*weight) * total / weight_sum;
        allocated += share;
        // share <= total, which came from an i32
        allocation.insert(name.clone(), share as i64);
    }

    let remainder = usize::try_from(total - allocated).unwrap_or(0);
    let receivers: Vec<ClusterWeight> = sort_by_weight(&matched)
        .into_iter()
        .filter(|c| c.weight > 0)
        .collect();
    for receiver in receivers.iter().cycle().take(remainder) {
        if let Some(replicas) = allocation.get_mut(&receiver.cluster_name) {
            *replicas += 1;
        }
    }

    allocation
}
