//! Output-store collaborator interfaces.
//!
//! The planning core only ever reads from the output store: existing records
//! are fetched per key during planning, and key samples feed range-boundary
//! computation. All writes happen later, outside this crate, by applying the
//! planned mutation lists.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::RwLock;

use crate::data::{MutationKind, Record};
use crate::errors::PlanError;
use crate::key::{extract_key, Key};
use crate::plan::KeyPlan;
use crate::types::FieldName;

/// Read interface onto the output store targeted by planned mutations.
///
/// Implementations must reflect the store's state at the start of the batch
/// and tolerate concurrent reads when the parallel driver is used.
pub trait OutputStore: Send + Sync {
    /// Records currently stored for `key`, in storage order.
    fn fetch_existing(&self, key: &Key) -> Result<Vec<Record>, PlanError>;
    /// A representative (not necessarily exact) sample of up to `target`
    /// known keys, used for range-boundary computation.
    fn sample_keys(&self, target: usize) -> Result<Vec<Key>, PlanError>;
}

/// In-memory output store for tests and small datasets.
///
/// Records are bucketed per key in insertion order. `apply` executes a key
/// plan's mutations strictly in list order, which is what makes it usable as
/// a reference for last-writer-wins scenarios.
pub struct InMemoryOutput {
    key_fields: Vec<FieldName>,
    records: RwLock<IndexMap<Key, Vec<Record>>>,
}

impl InMemoryOutput {
    /// Create an empty store keyed by `key_fields`.
    pub fn new(key_fields: impl IntoIterator<Item = impl Into<FieldName>>) -> Self {
        Self {
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            records: RwLock::new(IndexMap::new()),
        }
    }

    /// Create a store pre-populated with `records`.
    pub fn with_records(
        key_fields: impl IntoIterator<Item = impl Into<FieldName>>,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Self, PlanError> {
        let store = Self::new(key_fields);
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Append one record under its extracted key.
    pub fn insert(&self, record: Record) -> Result<(), PlanError> {
        let key = extract_key(&record, &self.key_fields)?;
        let mut guard = self.write_guard()?;
        guard.entry(key).or_default().push(record);
        Ok(())
    }

    /// Apply a planned mutation list for one key, strictly in list order.
    pub fn apply(&self, plan: &KeyPlan) -> Result<(), PlanError> {
        let mut guard = self.write_guard()?;
        let bucket = guard.entry(plan.key.clone()).or_default();
        for mutation in &plan.mutations {
            match mutation.kind {
                MutationKind::None => {}
                MutationKind::Insert => bucket.push(mutation.record.clone()),
                MutationKind::Update | MutationKind::Upsert | MutationKind::Overwrite => {
                    bucket.clear();
                    bucket.push(mutation.record.clone());
                }
                MutationKind::Delete => bucket.clear(),
            }
        }
        if bucket.is_empty() {
            guard.shift_remove(&plan.key);
        }
        Ok(())
    }

    /// Number of keys currently holding at least one record.
    pub fn key_count(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or(0)
    }

    fn write_guard(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, IndexMap<Key, Vec<Record>>>, PlanError> {
        self.records
            .write()
            .map_err(|_| PlanError::OutputStore("output lock poisoned".into()))
    }
}

impl OutputStore for InMemoryOutput {
    fn fetch_existing(&self, key: &Key) -> Result<Vec<Record>, PlanError> {
        let guard = self
            .records
            .read()
            .map_err(|_| PlanError::OutputStore("output lock poisoned".into()))?;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    fn sample_keys(&self, target: usize) -> Result<Vec<Key>, PlanError> {
        let guard = self
            .records
            .read()
            .map_err(|_| PlanError::OutputStore("output lock poisoned".into()))?;
        let keys: Vec<Key> = guard.keys().cloned().collect();
        if keys.len() <= target {
            return Ok(keys);
        }
        // Seed from the key population size so the sample is stable for a
        // fixed store state.
        let mut rng = StdRng::seed_from_u64(keys.len() as u64);
        Ok(keys.choose_multiple(&mut rng, target).cloned().collect())
    }
}
