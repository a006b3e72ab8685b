//! Compatible-TSON: a JSON-only interop encoding where every leaf becomes a
//! two-field object `{"value": V, "timestamp": T}` and containers keep their
//! ordinary JSON shape.
//!
//! Built on `serde_json::Value` as an intermediate form, the same way
//! `json-joy-json-pack::ejson` layers its own value type over
//! `serde_json::Value` rather than hand-rolling a second JSON grammar.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number};

use crate::error::ParseError;
use crate::model::{Leaf, LeafValue, Value, UNSPECIFIED_TIMESTAMP};

/// `Value`'s `serde` shape is Compatible-TSON: every leaf round-trips as
/// `{"value": V, "timestamp": T}`, so a `tson::Value` composes with
/// `serde_json` (and any other serde-based format) the same way every other
/// crate in this workspace does, without a second hand-rolled grammar.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        from_json(&json).map_err(D::Error::custom)
    }
}

/// Serializes `value` as Compatible-TSON JSON text.
pub fn emit_compatible(value: &Value) -> String {
    to_json(value).to_string()
}

/// Serializes `value` as pretty-printed Compatible-TSON JSON text.
pub fn emit_compatible_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(&to_json(value)).expect("serde_json::Value never fails to serialize")
}

/// Parses Compatible-TSON JSON text back into a TSON [`Value`].
///
/// A JSON object is read as a leaf wrapper exactly when it has precisely
/// the two keys `value` and `timestamp` (with `timestamp` an integer);
/// otherwise it is read as a TSON `Object`. This mirrors the one structural
/// ambiguity the format has: a container whose only two entries happen to
/// be named `value` and `timestamp` cannot be distinguished from a leaf.
pub fn parse_compatible(text: &str) -> Result<Value, ParseError> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ParseError::new(e.column(), e.to_string()))?;
    from_json(&json)
}

/// Converts a TSON [`Value`] to its Compatible-TSON JSON form. Exposed for
/// callers (e.g. `tson-patch`'s wire codec) that need to embed a TSON value
/// inside a larger JSON document without going through text.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Leaf(leaf) => leaf_to_json(leaf),
        Value::Object(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), to_json(v));
            }
            serde_json::Value::Object(obj)
        }
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
    }
}

fn leaf_to_json(leaf: &Leaf) -> serde_json::Value {
    let value = match &leaf.value {
        LeafValue::String(s) => serde_json::Value::String(s.clone()),
        LeafValue::Number(n) => Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        LeafValue::Bool(b) => serde_json::Value::Bool(*b),
    };
    let mut obj = Map::new();
    obj.insert("value".to_string(), value);
    obj.insert(
        "timestamp".to_string(),
        serde_json::Value::Number(Number::from(leaf.timestamp)),
    );
    serde_json::Value::Object(obj)
}

/// Parses a [`serde_json::Value`] already in Compatible-TSON shape into a
/// TSON [`Value`]. The counterpart to [`to_json`].
pub fn from_json(json: &serde_json::Value) -> Result<Value, ParseError> {
    match json {
        serde_json::Value::Object(obj) => {
            if let Some(leaf) = try_leaf_wrapper(obj)? {
                return Ok(leaf);
            }
            let mut map = std::collections::BTreeMap::new();
            for (k, v) in obj {
                map.insert(k.clone(), from_json(v)?);
            }
            Ok(Value::Object(map))
        }
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_json(item)?);
            }
            Ok(Value::Array(out))
        }
        other => Err(ParseError::new(
            0,
            format!("bare {other} at container position is not valid Compatible-TSON"),
        )),
    }
}

fn try_leaf_wrapper(obj: &Map<String, serde_json::Value>) -> Result<Option<Value>, ParseError> {
    if obj.len() != 2 || !obj.contains_key("value") || !obj.contains_key("timestamp") {
        return Ok(None);
    }
    let timestamp = match &obj["timestamp"] {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ParseError::new(0, "timestamp must be an integer"))?,
        serde_json::Value::Null => UNSPECIFIED_TIMESTAMP,
        _ => return Ok(None),
    };
    let leaf_value = match &obj["value"] {
        serde_json::Value::String(s) => LeafValue::String(s.clone()),
        serde_json::Value::Number(n) => LeafValue::Number(
            n.as_f64()
                .ok_or_else(|| ParseError::new(0, "non-finite number in leaf value"))?,
        ),
        serde_json::Value::Bool(b) => LeafValue::Bool(*b),
        _ => return Ok(None),
    };
    Ok(Some(Value::leaf(leaf_value, timestamp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_leaf() {
        let v = Value::number(72.5, 1700000000);
        let text = emit_compatible(&v);
        assert_eq!(parse_compatible(&text).unwrap(), v);
    }

    #[test]
    fn round_trips_nested_structure() {
        let v = Value::object([
            ("speed".to_string(), Value::number(72.5, 1)),
            (
                "tirePressure".to_string(),
                Value::array([Value::number(32.0, 2), Value::number(33.0, 3)]),
            ),
        ]);
        let text = emit_compatible(&v);
        assert_eq!(parse_compatible(&text).unwrap(), v);
    }

    #[test]
    fn serde_impl_round_trips_through_serde_json() {
        let v = Value::object([
            ("speed".to_string(), Value::number(72.5, 1)),
            ("engineOn".to_string(), Value::bool(true, 2)),
        ]);
        let text = serde_json::to_string(&v).unwrap();
        let restored: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, v);
    }

    #[test]
    fn leaf_wrapper_shape_is_value_and_timestamp_keys() {
        let v = Value::bool(true, 10);
        let json: serde_json::Value = serde_json::from_str(&emit_compatible(&v)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["value"], serde_json::json!(true));
        assert_eq!(obj["timestamp"], serde_json::json!(10));
    }

    #[test]
    fn unspecified_timestamp_round_trips() {
        let v = Value::string("x", UNSPECIFIED_TIMESTAMP);
        let text = emit_compatible(&v);
        assert_eq!(parse_compatible(&text).unwrap(), v);
    }
}
