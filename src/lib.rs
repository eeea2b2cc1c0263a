#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Strategy configuration fragments.
pub mod config;
/// Centralized constants used across partitioning and planning.
pub mod constants;
/// Record, field-value, and mutation types.
pub mod data;
/// Natural keys and key extraction.
pub mod key;
/// Partition balance metrics helpers.
pub mod metrics;
/// Output-store collaborator interfaces.
pub mod output;
/// Partition assignment strategies and the partitioner factory.
pub mod partition;
/// Mutation-planner contract and the per-key grouping driver.
pub mod plan;
/// Shared type aliases.
pub mod types;

mod errors;
mod hash;

pub use config::StrategyConfig;
pub use data::{FieldValue, Mutation, MutationKind, Record};
pub use errors::PlanError;
pub use key::{extract_key, Key};
pub use output::{InMemoryOutput, OutputStore};
pub use partition::{
    split_by_partition, HashPartitioner, Partitioner, PartitionerRegistry, RangePartitioner,
};
pub use plan::{plan_batch, plan_batch_parallel, KeyPlan, MutationPlanner, PlannerRegistry};
pub use types::{FieldName, PartitionId, StrategyName};
