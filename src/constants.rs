/// Constants used by partition assignment and the partitioner factory.
pub mod partition {
    /// Keys sampled per target partition when computing range boundaries.
    pub const RANGE_SAMPLE_PER_PARTITION: usize = 20;
    /// Seed mixed into stable key hashing for hash partitioning.
    pub const HASH_PARTITION_SEED: u64 = 0x9E37_79B9;
    /// Configuration name of the built-in hash strategy.
    pub const HASH_STRATEGY: &str = "hash";
    /// Configuration name of the built-in range strategy.
    pub const RANGE_STRATEGY: &str = "range";
}

/// Constants used by strategy configuration fragments.
pub mod config {
    /// Configuration key selecting a partitioning or planning strategy.
    pub const TYPE_KEY: &str = "type";
}
