//! The mutation-planner contract and the per-key grouping driver.
//!
//! Ownership model:
//! - `MutationPlanner` is the pluggable strategy interface: one call per key,
//!   returning an ordered mutation list.
//! - `PlannerRegistry` builds a configured planner from a `{type, ...}`
//!   fragment, the same way partitioners are built.
//! - `plan_batch` / `plan_batch_parallel` own grouping, existing-record
//!   lookup, and error attribution; they never reorder planner output.

use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StrategyConfig;
use crate::data::{Mutation, Record};
use crate::errors::PlanError;
use crate::key::{extract_key, Key};
use crate::output::OutputStore;
use crate::types::{FieldName, StrategyName};

/// Pluggable per-key planning strategy.
///
/// For a fixed `(key, arriving, existing)` input, planning is expected to be
/// deterministic: replaying the same batch reproduces the same mutations
/// (and the same errors), which is why the engine never retries a failed key.
pub trait MutationPlanner: std::fmt::Debug + Send + Sync {
    /// Strategy identity used in logs and error attribution.
    fn name(&self) -> &str;

    /// Field names that constitute the natural key of arriving records.
    ///
    /// Used to group arriving records by key and to retrieve existing
    /// records from the output store.
    fn key_field_names(&self) -> Vec<FieldName>;

    /// Plan the mutations for one key.
    ///
    /// `arriving` holds the key's records from the current batch in arrival
    /// order; `existing` holds what the output store currently stores for the
    /// key. The returned list may be empty. Mutations are applied in list
    /// order, so strategies needing delete-then-insert semantics must encode
    /// that ordering themselves.
    fn plan_mutations_for_key(
        &self,
        key: &Key,
        arriving: &[Record],
        existing: &[Record],
    ) -> Result<Vec<Mutation>, PlanError>;

    /// One-time configuration hook, invoked by the registry at build time.
    fn configure(&mut self, _config: &StrategyConfig) -> Result<(), PlanError> {
        Ok(())
    }
}

/// Ordered mutation list planned for one key.
///
/// Intra-key order must be preserved through to application; no ordering
/// guarantee exists across different keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPlan {
    /// The natural key the mutations belong to.
    pub key: Key,
    /// Mutations in application order, verbatim from the strategy.
    pub mutations: Vec<Mutation>,
}

/// Constructor for a registered planning strategy.
pub type PlannerCtor = Box<dyn Fn() -> Box<dyn MutationPlanner> + Send + Sync>;

/// Name-to-constructor registry for planning strategies.
#[derive(Default)]
pub struct PlannerRegistry {
    planners: HashMap<StrategyName, PlannerCtor>,
}

impl PlannerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a planning strategy constructor under `name`.
    pub fn register(
        &mut self,
        name: impl Into<StrategyName>,
        ctor: impl Fn() -> Box<dyn MutationPlanner> + Send + Sync + 'static,
    ) {
        self.planners.insert(name.into(), Box::new(ctor));
    }

    /// Build and configure the planner selected by `config`.
    ///
    /// Unknown names and failing configure hooks surface as
    /// [`PlanError::StrategyLoad`] before any batch is processed.
    pub fn build(&self, config: &StrategyConfig) -> Result<Box<dyn MutationPlanner>, PlanError> {
        let ctor = self
            .planners
            .get(&config.strategy)
            .ok_or_else(|| PlanError::StrategyLoad {
                name: config.strategy.clone(),
                reason: "no planner registered under this name".to_string(),
            })?;
        let mut planner = ctor();
        planner
            .configure(config)
            .map_err(|err| PlanError::StrategyLoad {
                name: config.strategy.clone(),
                reason: err.to_string(),
            })?;
        debug!(name = %config.strategy, "built mutation planner");
        Ok(planner)
    }
}

/// Plan an arriving batch against the output store, one planner call per
/// distinct key.
///
/// Keys appear in first-arrival order; each key's mutation order is the
/// strategy's output, verbatim. Existing records are looked up only for keys
/// present in the arriving batch. Any failure aborts the whole batch: either
/// all keys planned successfully, or the error names the offending key.
pub fn plan_batch(
    planner: &dyn MutationPlanner,
    output: &dyn OutputStore,
    arriving: &[Record],
) -> Result<Vec<KeyPlan>, PlanError> {
    let groups = group_by_key(arriving, &planner.key_field_names())?;
    let mut plans = Vec::with_capacity(groups.len());
    for (key, records) in groups {
        plans.push(plan_for_key(planner, output, key, &records)?);
    }
    log_planned(planner, &plans);
    Ok(plans)
}

/// Same contract as [`plan_batch`], with per-key planning fanned out across
/// the rayon thread pool.
///
/// Distinct keys are planned independently, so the output (ordering
/// included) and the failure semantics match the sequential driver; the
/// output store must tolerate concurrent `fetch_existing` calls.
pub fn plan_batch_parallel(
    planner: &dyn MutationPlanner,
    output: &dyn OutputStore,
    arriving: &[Record],
) -> Result<Vec<KeyPlan>, PlanError> {
    let groups: Vec<(Key, Vec<Record>)> = group_by_key(arriving, &planner.key_field_names())?
        .into_iter()
        .collect();
    let plans = groups
        .into_par_iter()
        .map(|(key, records)| plan_for_key(planner, output, key, &records))
        .collect::<Result<Vec<_>, _>>()?;
    log_planned(planner, &plans);
    Ok(plans)
}

/// Group an arriving batch by natural key, preserving first-arrival key
/// order and intra-key arrival order.
fn group_by_key(
    arriving: &[Record],
    key_fields: &[FieldName],
) -> Result<IndexMap<Key, Vec<Record>>, PlanError> {
    let mut groups: IndexMap<Key, Vec<Record>> = IndexMap::new();
    for record in arriving {
        let key = extract_key(record, key_fields)?;
        groups.entry(key).or_default().push(record.clone());
    }
    Ok(groups)
}

fn plan_for_key(
    planner: &dyn MutationPlanner,
    output: &dyn OutputStore,
    key: Key,
    arriving: &[Record],
) -> Result<KeyPlan, PlanError> {
    let existing = output.fetch_existing(&key)?;
    let mutations = planner
        .plan_mutations_for_key(&key, arriving, &existing)
        .map_err(|err| PlanError::Planning {
            strategy: planner.name().to_string(),
            key: key.to_string(),
            reason: err.to_string(),
        })?;
    Ok(KeyPlan { key, mutations })
}

fn log_planned(planner: &dyn MutationPlanner, plans: &[KeyPlan]) {
    let mutations: usize = plans.iter().map(|plan| plan.mutations.len()).sum();
    debug!(
        strategy = planner.name(),
        keys = plans.len(),
        mutations,
        "planned batch"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldValue;

    #[derive(Debug)]
    struct NoopPlanner;

    impl MutationPlanner for NoopPlanner {
        fn name(&self) -> &str {
            "noop"
        }

        fn key_field_names(&self) -> Vec<FieldName> {
            vec!["id".to_string()]
        }

        fn plan_mutations_for_key(
            &self,
            _key: &Key,
            _arriving: &[Record],
            _existing: &[Record],
        ) -> Result<Vec<Mutation>, PlanError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn registry_rejects_unknown_planner_names() {
        let registry = PlannerRegistry::new();
        let config = StrategyConfig::new("nonexistent");
        match registry.build(&config) {
            Err(PlanError::StrategyLoad { name, .. }) => assert_eq!(name, "nonexistent"),
            other => panic!("expected StrategyLoad, got {other:?}"),
        }
    }

    #[test]
    fn registry_builds_registered_planner() {
        let mut registry = PlannerRegistry::new();
        registry.register("noop", || Box::new(NoopPlanner));
        let planner = registry.build(&StrategyConfig::new("noop")).unwrap();
        assert_eq!(planner.name(), "noop");
    }

    #[test]
    fn group_by_key_preserves_first_arrival_order() {
        let records: Vec<Record> = [3, 1, 3, 2]
            .iter()
            .map(|id| Record::from_fields([("id", FieldValue::Int(*id))]))
            .collect();
        let groups = group_by_key(&records, &["id".to_string()]).unwrap();
        let keys: Vec<Key> = groups.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Key::new([FieldValue::Int(3)]),
                Key::new([FieldValue::Int(1)]),
                Key::new([FieldValue::Int(2)]),
            ]
        );
        assert_eq!(groups[&Key::new([FieldValue::Int(3)])].len(), 2);
    }
}
