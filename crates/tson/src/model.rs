//! The TSON tree: a tagged union of `Object`, `Array`, and `Leaf<T>`.
//!
//! Mirrors the shape `json-joy-core::model` gives its CRDT node tree, but
//! as a plain (non-CRDT) value: every primitive leaf carries its own
//! timestamp, and containers are unordered-but-canonically-sorted maps or
//! plain sequences.

use std::collections::BTreeMap;

/// The scalar kinds a [`Leaf`] may hold.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl LeafValue {
    /// A short name for the scalar kind, used in [`crate::TypeError`] messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LeafValue::String(_) => "string",
            LeafValue::Number(_) => "number",
            LeafValue::Bool(_) => "bool",
        }
    }

    /// Returns `true` if `self` and `other` are the same primitive kind,
    /// ignoring their actual value.
    pub fn same_kind(&self, other: &LeafValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A primitive leaf: a value paired with the timestamp of its last write.
///
/// `timestamp == -1` means "unspecified". All other values
/// are opaque, monotonically comparable integers chosen by the embedding
/// (Unix-epoch nanoseconds is the recommended convention, but nothing here
/// enforces a unit).
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub value: LeafValue,
    pub timestamp: i64,
}

/// Timestamp value meaning "unspecified".
pub const UNSPECIFIED_TIMESTAMP: i64 = -1;

impl Leaf {
    pub fn new(value: LeafValue, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

/// A TSON tree node: an `Object`, an `Array`, or a `Leaf`.
///
/// Object iteration is always key-sorted (via `BTreeMap`) so that
/// serialization and diffing are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Leaf(Leaf),
}

impl Value {
    pub fn leaf(value: LeafValue, timestamp: i64) -> Self {
        Value::Leaf(Leaf::new(value, timestamp))
    }

    pub fn string(s: impl Into<String>, timestamp: i64) -> Self {
        Value::leaf(LeafValue::String(s.into()), timestamp)
    }

    pub fn number(n: f64, timestamp: i64) -> Self {
        Value::leaf(LeafValue::Number(n), timestamp)
    }

    pub fn bool(b: bool, timestamp: i64) -> Self {
        Value::leaf(LeafValue::Bool(b), timestamp)
    }

    pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(entries.into_iter().collect())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Value::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The maximum timestamp of any leaf in this subtree, or `0` for an
    /// empty container.
    pub fn latest_timestamp(&self) -> i64 {
        match self {
            Value::Leaf(leaf) => leaf.timestamp,
            Value::Object(map) => map
                .values()
                .map(Value::latest_timestamp)
                .max()
                .unwrap_or(0),
            Value::Array(arr) => arr
                .iter()
                .map(Value::latest_timestamp)
                .max()
                .unwrap_or(0),
        }
    }

    /// Structural equality including every leaf's timestamp.
    pub fn equal_with_timestamps(&self, other: &Value) -> bool {
        self == other
    }

    /// Structural equality ignoring leaf timestamps.
    pub fn equal_without_timestamps(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Leaf(a), Value::Leaf(b)) => a.value == b.value,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.get(k).is_some_and(|bv| v.equal_without_timestamps(bv))
                    })
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.equal_without_timestamps(y))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_timestamp_of_leaf_is_its_own() {
        let v = Value::number(1.0, 42);
        assert_eq!(v.latest_timestamp(), 42);
    }

    #[test]
    fn latest_timestamp_of_empty_container_is_zero() {
        assert_eq!(Value::object([]).latest_timestamp(), 0);
        assert_eq!(Value::array([]).latest_timestamp(), 0);
    }

    #[test]
    fn latest_timestamp_is_max_over_descendants() {
        let v = Value::object([
            ("a".to_string(), Value::number(1.0, 10)),
            (
                "b".to_string(),
                Value::array([Value::number(2.0, 30), Value::number(3.0, 20)]),
            ),
        ]);
        assert_eq!(v.latest_timestamp(), 30);
    }

    #[test]
    fn equal_without_timestamps_ignores_leaf_timestamp() {
        let a = Value::number(1.0, 10);
        let b = Value::number(1.0, 20);
        assert!(a.equal_without_timestamps(&b));
        assert!(!a.equal_with_timestamps(&b));
    }

    #[test]
    fn equal_without_timestamps_still_checks_value() {
        let a = Value::number(1.0, 10);
        let b = Value::number(2.0, 10);
        assert!(!a.equal_without_timestamps(&b));
    }

    #[test]
    fn object_key_order_is_not_semantic() {
        let a = Value::object([
            ("b".to_string(), Value::bool(true, 1)),
            ("a".to_string(), Value::bool(false, 1)),
        ]);
        let b = Value::object([
            ("a".to_string(), Value::bool(false, 1)),
            ("b".to_string(), Value::bool(true, 1)),
        ]);
        assert_eq!(a, b);
    }
}
