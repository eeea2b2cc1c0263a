use thiserror::Error;

use crate::types::{FieldName, StrategyName};

/// Error type for configuration, strategy loading, and planning failures.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid planning configuration: {0}")]
    Configuration(String),
    #[error("strategy '{name}' could not be loaded: {reason}")]
    StrategyLoad { name: StrategyName, reason: String },
    #[error("key field '{field}' is missing from the record schema")]
    MissingField { field: FieldName },
    #[error("strategy '{strategy}' failed while planning key {key}: {reason}")]
    Planning {
        strategy: String,
        key: String,
        reason: String,
    },
    #[error("output store failure: {0}")]
    OutputStore(String),
}
