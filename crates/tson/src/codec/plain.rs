//! Plain JSON codec: strips every timestamp, emitting (or reading) an
//! ordinary JSON document. Lossy in one direction — there is
//! no `parse_plain` that recovers timestamps, since none survive encoding.

use serde_json::{Map, Number};

use crate::model::{LeafValue, Value};

/// Serializes `value` to a `serde_json::Value`, dropping all timestamps.
pub fn to_plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Leaf(leaf) => match &leaf.value {
            LeafValue::String(s) => serde_json::Value::String(s.clone()),
            LeafValue::Number(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            LeafValue::Bool(b) => serde_json::Value::Bool(*b),
        },
        Value::Object(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), to_plain_json(v));
            }
            serde_json::Value::Object(obj)
        }
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_plain_json).collect()),
    }
}

/// Serializes `value` to plain JSON text, dropping all timestamps.
pub fn emit_plain(value: &Value) -> String {
    to_plain_json(value).to_string()
}

/// Serializes `value` to pretty-printed plain JSON text.
pub fn emit_plain_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(&to_plain_json(value)).expect("serde_json::Value never fails to serialize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_timestamps_from_leaves() {
        let v = Value::number(72.5, 1700000000);
        assert_eq!(emit_plain(&v), "72.5");
    }

    #[test]
    fn strips_timestamps_from_nested_structure() {
        let v = Value::object([
            ("speed".to_string(), Value::number(72.5, 1)),
            (
                "tirePressure".to_string(),
                Value::array([Value::number(32.0, 2), Value::number(33.0, 3)]),
            ),
        ]);
        assert_eq!(emit_plain(&v), r#"{"speed":72.5,"tirePressure":[32.0,33.0]}"#);
    }
}
