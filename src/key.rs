//! Natural keys and key extraction.
//!
//! A `Key` is the ordered tuple of field values that identifies all records
//! belonging to the same logical entity across arriving and existing data.
//! Keys are hashable and totally ordered so one key type serves both hash-
//! and range-based partitioning.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{FieldValue, Record};
use crate::errors::PlanError;
use crate::types::FieldName;

/// An ordered tuple of field values derived from a record.
///
/// Two keys are equal iff all corresponding field values are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(Vec<FieldValue>);

impl Key {
    /// Build a key directly from field values, in order.
    pub fn new(values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self(values.into_iter().collect())
    }

    /// The key's field values, in key-field order.
    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Derive the natural key of `record` from an ordered list of key field names.
///
/// Fails with [`PlanError::MissingField`] when any key field is absent from
/// the record's schema. Side-effect free.
pub fn extract_key(record: &Record, key_fields: &[FieldName]) -> Result<Key, PlanError> {
    let mut values = Vec::with_capacity(key_fields.len());
    for field in key_fields {
        let value = record.get(field).ok_or_else(|| PlanError::MissingField {
            field: field.clone(),
        })?;
        values.push(value.clone());
    }
    Ok(Key(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, version: &str) -> Record {
        Record::from_fields([
            ("id", FieldValue::Int(id)),
            ("version", FieldValue::Text(version.to_string())),
            ("payload", FieldValue::Text("body".to_string())),
        ])
    }

    #[test]
    fn extract_key_keeps_field_order() {
        let rec = record(7, "a");
        let key = extract_key(&rec, &["version".to_string(), "id".to_string()]).unwrap();
        assert_eq!(
            key.values(),
            &[FieldValue::Text("a".to_string()), FieldValue::Int(7)]
        );
    }

    #[test]
    fn extract_key_missing_field_names_the_field() {
        let rec = record(7, "a");
        let err = extract_key(&rec, &["absent".to_string()]).unwrap_err();
        match err {
            PlanError::MissingField { field } => assert_eq!(field, "absent"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn keys_equal_by_value_regardless_of_source_record() {
        let a = extract_key(&record(1, "x"), &["id".to_string()]).unwrap();
        let b = extract_key(&record(1, "y"), &["id".to_string()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn record_field_order_does_not_affect_key_equality() {
        let forward = Record::from_fields([
            ("region", FieldValue::Text("eu".to_string())),
            ("id", FieldValue::Int(3)),
        ]);
        let reversed = Record::from_fields([
            ("id", FieldValue::Int(3)),
            ("region", FieldValue::Text("eu".to_string())),
        ]);
        let fields = vec!["id".to_string(), "region".to_string()];
        assert_eq!(
            extract_key(&forward, &fields).unwrap(),
            extract_key(&reversed, &fields).unwrap()
        );
    }

    #[test]
    fn key_display_renders_tuple() {
        let key = Key::new([FieldValue::Int(1), FieldValue::Text("a".to_string())]);
        assert_eq!(key.to_string(), "(1, \"a\")");
    }

    #[test]
    fn keys_order_by_value() {
        let low = Key::new([FieldValue::Int(1)]);
        let high = Key::new([FieldValue::Int(2)]);
        assert!(low < high);
    }
}
