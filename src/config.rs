use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::config::TYPE_KEY;
use crate::errors::PlanError;
use crate::types::StrategyName;

/// Declarative configuration fragment selecting a partitioning or planning
/// strategy.
///
/// The `type` key names the strategy; every other key is strategy-specific
/// and passed through verbatim to the strategy's configure hook.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name: `hash`, `range`, or a registered custom name.
    #[serde(rename = "type")]
    pub strategy: StrategyName,
    /// Strategy-specific options, untouched by the factories.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl StrategyConfig {
    /// Create a fragment selecting `strategy` with no options.
    pub fn new(strategy: impl Into<StrategyName>) -> Self {
        Self {
            strategy: strategy.into(),
            options: Map::new(),
        }
    }

    /// Append a strategy-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Parse a fragment from a JSON value, e.g. `{"type": "hash"}`.
    ///
    /// A missing or non-string `type` key is a configuration error; the
    /// message embeds the offending fragment.
    pub fn from_value(value: Value) -> Result<Self, PlanError> {
        match value.get(TYPE_KEY) {
            None => {
                return Err(PlanError::Configuration(format!(
                    "missing '{TYPE_KEY}' in partitioning fragment {value}"
                )));
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(PlanError::Configuration(format!(
                    "'{TYPE_KEY}' must be a string, got {other} in fragment {value}"
                )));
            }
        }
        let fragment = value.to_string();
        serde_json::from_value(value)
            .map_err(|err| PlanError::Configuration(format!("{fragment}: {err}")))
    }

    /// Look up a strategy-specific option by key.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}
