use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::FieldName;

/// A single typed value inside a record.
///
/// Values are hashable and totally ordered so that keys built from them can be
/// hash- and range-partitioned. Floats compare and hash by bit pattern;
/// values of different variants order by a fixed variant rank.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FieldValue {
    /// Absent/null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// UTC timestamp value.
    Timestamp(DateTime<Utc>),
    /// Nested structured value.
    Struct(Record),
}

impl FieldValue {
    fn variant_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Int(_) => 2,
            FieldValue::Float(_) => 3,
            FieldValue::Text(_) => 4,
            FieldValue::Timestamp(_) => 5,
            FieldValue::Struct(_) => 6,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a.to_bits() == b.to_bits(),
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a == b,
            (FieldValue::Struct(a), FieldValue::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            FieldValue::Null => {}
            FieldValue::Bool(value) => value.hash(state),
            FieldValue::Int(value) => value.hash(state),
            FieldValue::Float(value) => value.to_bits().hash(state),
            FieldValue::Text(value) => value.hash(state),
            FieldValue::Timestamp(value) => value.hash(state),
            FieldValue::Struct(value) => value.hash(state),
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Int(a), FieldValue::Int(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Struct(a), FieldValue::Struct(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Text(value) => write!(f, "\"{value}\""),
            FieldValue::Timestamp(value) => write!(f, "{}", value.to_rfc3339()),
            FieldValue::Struct(value) => {
                write!(f, "{{")?;
                for (idx, (name, field)) in value.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {field}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// An immutable ordered mapping from field name to value; one row of data,
/// either arriving or already persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: IndexMap<FieldName, FieldValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs, keeping pair order.
    pub fn from_fields<N, I>(fields: I) -> Self
    where
        N: Into<FieldName>,
        I: IntoIterator<Item = (N, FieldValue)>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Append a field, replacing any earlier value under the same name.
    pub fn with(mut self, name: impl Into<FieldName>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether the record schema contains `name`.
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in schema order.
    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.keys()
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn sorted_entries(&self) -> Vec<(&FieldName, &FieldValue)> {
        let mut entries: Vec<_> = self.fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

// Equality via IndexMap is independent of field insertion order, so hashing
// and ordering must go through name-sorted entries to stay consistent.
impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let entries = self.sorted_entries();
        entries.len().hash(state);
        for (name, value) in entries {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted_entries().cmp(&other.sorted_entries())
    }
}

/// Kind of change operation to apply to persisted output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// No change; the record is carried for bookkeeping only.
    None,
    /// Insert a new record.
    Insert,
    /// Update the stored record(s) matching the payload key.
    Update,
    /// Delete the stored record(s) matching the payload key.
    Delete,
    /// Insert-or-update by payload key.
    Upsert,
    /// Replace everything stored for the payload key.
    Overwrite,
}

/// A single change operation for one record. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    /// Operation kind.
    pub kind: MutationKind,
    /// Payload record the operation applies to.
    pub record: Record,
}

impl Mutation {
    /// Create a mutation from a kind and payload record.
    pub fn new(kind: MutationKind, record: Record) -> Self {
        Self { kind, record }
    }
}
