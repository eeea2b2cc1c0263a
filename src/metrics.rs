use std::collections::HashMap;

use crate::types::PartitionId;

/// Aggregate balance metrics for per-partition key counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionBalance {
    pub total: usize,
    pub partitions: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub max_share: f64,
    pub min_share: f64,
    pub ratio: f64,
    pub per_partition: Vec<PartitionShare>,
}

/// Per-partition share of a batch for balance inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionShare {
    pub partition: PartitionId,
    pub count: usize,
    pub share: f64,
}

/// Compute balance metrics from per-partition key counts.
/// Partitions absent from the map count as empty only if callers insert them.
pub fn partition_balance(counts: &HashMap<PartitionId, usize>) -> Option<PartitionBalance> {
    if counts.is_empty() {
        return None;
    }
    let total: usize = counts.values().sum();
    let partitions = counts.len();
    let min = *counts.values().min().expect("counts non-empty");
    let max = *counts.values().max().expect("counts non-empty");
    let mean = total as f64 / partitions as f64;
    let max_share = if total == 0 {
        0.0
    } else {
        max as f64 / total as f64
    };
    let min_share = if total == 0 {
        0.0
    } else {
        min as f64 / total as f64
    };
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_partition: Vec<PartitionShare> = counts
        .iter()
        .map(|(partition, count)| PartitionShare {
            partition: *partition,
            count: *count,
            share: if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64
            },
        })
        .collect();
    per_partition.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.partition.cmp(&b.partition))
    });
    Some(PartitionBalance {
        total,
        partitions,
        min,
        max,
        mean,
        max_share,
        min_share,
        ratio,
        per_partition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_balance_reports_even_spread() {
        let mut counts = HashMap::new();
        counts.insert(0, 3);
        counts.insert(1, 3);
        let balance = partition_balance(&counts).expect("balance");
        assert_eq!(balance.total, 6);
        assert_eq!(balance.partitions, 2);
        assert!((balance.ratio - 1.0).abs() < 1e-6);
        assert!(
            balance
                .per_partition
                .iter()
                .all(|entry| (entry.share - 0.5).abs() < 1e-6)
        );
    }

    #[test]
    fn partition_balance_reports_skew() {
        let mut counts = HashMap::new();
        counts.insert(0, 6);
        counts.insert(1, 2);
        counts.insert(2, 2);
        let balance = partition_balance(&counts).expect("balance");
        assert_eq!(balance.max, 6);
        assert_eq!(balance.min, 2);
        assert!((balance.ratio - 3.0).abs() < 1e-6);
        assert_eq!(balance.per_partition[0].partition, 0);
        assert!((balance.per_partition[0].share - 0.6).abs() < 1e-6);
    }

    #[test]
    fn partition_balance_empty_counts_is_none() {
        assert_eq!(partition_balance(&HashMap::new()), None);
    }
}
