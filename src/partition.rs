//! Partition assignment strategies and the partitioner factory.
//!
//! Ownership model:
//! - `Partitioner` is the orchestration-facing assignment interface.
//! - `HashPartitioner` and `RangePartitioner` are the built-in strategies.
//! - `PartitionerRegistry` owns the name-to-constructor mapping for custom
//!   strategies and builds any strategy from a declarative config fragment.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::constants::partition::{
    HASH_PARTITION_SEED, HASH_STRATEGY, RANGE_SAMPLE_PER_PARTITION, RANGE_STRATEGY,
};
use crate::data::Record;
use crate::errors::PlanError;
use crate::hash::stable_hash_key;
use crate::key::{extract_key, Key};
use crate::output::OutputStore;
use crate::types::{FieldName, PartitionId, StrategyName};

/// Deterministic assignment from keys to worker partitions.
///
/// Instances are built once per batch/run and then invoked concurrently, once
/// per key, so `partition` must be safe for concurrent read-only use after
/// the one-time `configure` step completes.
pub trait Partitioner: std::fmt::Debug + Send + Sync {
    /// Strategy identity used in logs and errors.
    fn name(&self) -> &str;
    /// Number of partitions this assignment produces.
    fn num_partitions(&self) -> usize;
    /// Partition for `key`, always in `[0, num_partitions())`.
    ///
    /// Identical key values map to the same partition on every invocation,
    /// across runs with the same configuration.
    fn partition(&self, key: &Key) -> PartitionId;
    /// One-time configuration hook.
    ///
    /// The factory invokes this exactly once, with the same configuration
    /// fragment it was given, before the instance is first used.
    fn configure(
        &mut self,
        _config: &StrategyConfig,
        _partitions: usize,
    ) -> Result<(), PlanError> {
        Ok(())
    }
}

/// Assigns `stable_hash(key) mod N`.
///
/// The hash is stable across process runs for a given key value, so
/// hash-based repartitioning of the same data is stable run to run.
#[derive(Debug)]
pub struct HashPartitioner {
    partitions: usize,
}

impl HashPartitioner {
    /// Create an assignment over `partitions` partitions.
    pub fn new(partitions: usize) -> Self {
        Self { partitions }
    }
}

impl Partitioner for HashPartitioner {
    fn name(&self) -> &str {
        HASH_STRATEGY
    }

    fn num_partitions(&self) -> usize {
        self.partitions
    }

    fn partition(&self, key: &Key) -> PartitionId {
        (stable_hash_key(HASH_PARTITION_SEED, key) % self.partitions as u64) as PartitionId
    }
}

/// Assigns by binary search over sampled boundary keys.
///
/// Unlike hash partitioning, partition index is non-decreasing in key order,
/// so range partitioning preserves global order across partitions.
#[derive(Debug)]
pub struct RangePartitioner {
    boundaries: Vec<Key>,
}

impl RangePartitioner {
    /// Compute boundaries from a key sample so that sampled keys spread
    /// approximately evenly over at most `partitions` partitions.
    ///
    /// Degrades gracefully: duplicate or missing sample keys shrink the
    /// boundary list, and an empty sample collapses to a single partition.
    pub fn from_sample(mut sample: Vec<Key>, partitions: usize) -> Self {
        if partitions <= 1 || sample.is_empty() {
            return Self {
                boundaries: Vec::new(),
            };
        }
        sample.sort();
        let mut boundaries: Vec<Key> = Vec::with_capacity(partitions - 1);
        for idx in 1..partitions {
            let candidate = &sample[idx * sample.len() / partitions];
            if boundaries.last() != Some(candidate) {
                boundaries.push(candidate.clone());
            }
        }
        Self { boundaries }
    }
}

impl Partitioner for RangePartitioner {
    fn name(&self) -> &str {
        RANGE_STRATEGY
    }

    fn num_partitions(&self) -> usize {
        self.boundaries.len() + 1
    }

    fn partition(&self, key: &Key) -> PartitionId {
        // Count of boundaries <= key; non-decreasing in key order.
        self.boundaries.partition_point(|boundary| boundary <= key)
    }
}

/// Constructor for a registered custom partitioner.
pub type PartitionerCtor = Box<dyn Fn() -> Box<dyn Partitioner> + Send + Sync>;

/// Factory translating a declarative config fragment plus a target partition
/// count into a concrete partition assignment.
///
/// Custom strategies are a name-to-constructor mapping populated at process
/// start and looked up by the fragment's `type`; the built-in `hash` and
/// `range` names are always available.
#[derive(Default)]
pub struct PartitionerRegistry {
    custom: HashMap<StrategyName, PartitionerCtor>,
}

impl PartitionerRegistry {
    /// Create a registry with only the built-in strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom strategy constructor under `name`.
    ///
    /// The constructor takes no arguments; the factory configures the
    /// instance once after construction.
    pub fn register(
        &mut self,
        name: impl Into<StrategyName>,
        ctor: impl Fn() -> Box<dyn Partitioner> + Send + Sync + 'static,
    ) {
        self.custom.insert(name.into(), Box::new(ctor));
    }

    /// Build the partition assignment selected by `config`.
    ///
    /// Fails eagerly, before any batch is processed: a zero partition count
    /// is a [`PlanError::Configuration`]; an unknown custom name, a failing
    /// configure hook, or a configured instance whose partition count does
    /// not match `partitions` is a [`PlanError::StrategyLoad`].
    pub fn build(
        &self,
        config: &StrategyConfig,
        partitions: usize,
        output: &dyn OutputStore,
    ) -> Result<Box<dyn Partitioner>, PlanError> {
        if partitions == 0 {
            return Err(PlanError::Configuration(
                "target partition count must be positive".to_string(),
            ));
        }
        match config.strategy.as_str() {
            HASH_STRATEGY => {
                debug!(partitions, "built hash partitioner");
                Ok(Box::new(HashPartitioner::new(partitions)))
            }
            RANGE_STRATEGY => {
                let sample = output.sample_keys(RANGE_SAMPLE_PER_PARTITION * partitions)?;
                let partitioner = RangePartitioner::from_sample(sample, partitions);
                if partitioner.num_partitions() < partitions {
                    warn!(
                        requested = partitions,
                        effective = partitioner.num_partitions(),
                        "range key sample too small, degrading partition count"
                    );
                }
                Ok(Box::new(partitioner))
            }
            name => {
                let ctor = self
                    .custom
                    .get(name)
                    .ok_or_else(|| PlanError::StrategyLoad {
                        name: name.to_string(),
                        reason: "no partitioner registered under this name".to_string(),
                    })?;
                let mut partitioner = ctor();
                partitioner
                    .configure(config, partitions)
                    .map_err(|err| PlanError::StrategyLoad {
                        name: name.to_string(),
                        reason: err.to_string(),
                    })?;
                if partitioner.num_partitions() != partitions {
                    return Err(PlanError::StrategyLoad {
                        name: name.to_string(),
                        reason: format!(
                            "configured instance reports {} partitions, expected {partitions}",
                            partitioner.num_partitions()
                        ),
                    });
                }
                debug!(strategy = name, partitions, "built custom partitioner");
                Ok(partitioner)
            }
        }
    }
}

/// Route an arriving batch into per-partition buckets before worker dispatch.
///
/// All records sharing a key land in the same bucket, and arrival order is
/// preserved within each bucket. Pure aside from key extraction failures.
pub fn split_by_partition(
    partitioner: &dyn Partitioner,
    records: &[Record],
    key_fields: &[FieldName],
) -> Result<Vec<Vec<Record>>, PlanError> {
    let mut buckets: Vec<Vec<Record>> = vec![Vec::new(); partitioner.num_partitions()];
    for record in records {
        let key = extract_key(record, key_fields)?;
        buckets[partitioner.partition(&key)].push(record.clone());
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldValue;

    fn int_key(value: i64) -> Key {
        Key::new([FieldValue::Int(value)])
    }

    #[test]
    fn hash_partition_is_deterministic_and_bounded() {
        let partitioner = HashPartitioner::new(10);
        for value in 0..100 {
            let key = int_key(value);
            let first = partitioner.partition(&key);
            assert!(first < 10);
            assert_eq!(first, partitioner.partition(&key));
        }
    }

    #[test]
    fn equal_keys_from_different_records_share_a_partition() {
        let partitioner = HashPartitioner::new(7);
        let a = Key::new([FieldValue::Int(42), FieldValue::Text("eu".to_string())]);
        let b = Key::new([FieldValue::Int(42), FieldValue::Text("eu".to_string())]);
        assert_eq!(partitioner.partition(&a), partitioner.partition(&b));
    }

    #[test]
    fn range_partition_preserves_key_order() {
        let sample: Vec<Key> = (0..100).map(int_key).collect();
        let partitioner = RangePartitioner::from_sample(sample, 4);
        let mut last = 0;
        for value in 0..100 {
            let partition = partitioner.partition(&int_key(value));
            assert!(partition >= last);
            assert!(partition < partitioner.num_partitions());
            last = partition;
        }
        assert_eq!(partitioner.num_partitions(), 4);
    }

    #[test]
    fn range_from_empty_sample_is_single_partition() {
        let partitioner = RangePartitioner::from_sample(Vec::new(), 8);
        assert_eq!(partitioner.num_partitions(), 1);
        assert_eq!(partitioner.partition(&int_key(123)), 0);
    }

    #[test]
    fn range_dedupes_boundaries_from_skewed_sample() {
        // All sampled keys identical: no usable boundary survives.
        let sample: Vec<Key> = (0..50).map(|_| int_key(7)).collect();
        let partitioner = RangePartitioner::from_sample(sample, 5);
        assert_eq!(partitioner.num_partitions(), 1);
    }

    #[test]
    fn split_by_partition_keeps_key_locality_and_arrival_order() {
        let records: Vec<Record> = [1, 2, 1, 3, 2, 1]
            .iter()
            .enumerate()
            .map(|(pos, id)| {
                Record::from_fields([
                    ("id", FieldValue::Int(*id)),
                    ("seq", FieldValue::Int(pos as i64)),
                ])
            })
            .collect();
        let partitioner = HashPartitioner::new(3);
        let key_fields = vec!["id".to_string()];
        let buckets = split_by_partition(&partitioner, &records, &key_fields).unwrap();

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), records.len());
        for bucket in &buckets {
            let mut last_seq = None;
            for record in bucket {
                let key = extract_key(record, &key_fields).unwrap();
                assert_eq!(
                    buckets
                        .iter()
                        .position(|b| b.iter().any(|r| r == record))
                        .unwrap(),
                    partitioner.partition(&key)
                );
                let seq = match record.get("seq") {
                    Some(FieldValue::Int(seq)) => *seq,
                    _ => panic!("missing seq"),
                };
                if let Some(last) = last_seq {
                    assert!(seq > last, "arrival order not preserved");
                }
                last_seq = Some(seq);
            }
        }
    }
}
