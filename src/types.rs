/// Field name inside a record schema.
/// Examples: `id`, `customer_id`, `effective_from`
pub type FieldName = String;
/// Name of a partitioning or planning strategy, as written in configuration.
/// Examples: `hash`, `range`, `region_affinity`
pub type StrategyName = String;
/// Worker partition index, always in `[0, num_partitions)`.
pub type PartitionId = usize;
