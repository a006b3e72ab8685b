//! The TSON-Patch wire format: a JSON array of operation objects, e.g.
//! `[{"op":"replace","path":"/speed","value":80.0,"timestamp":100}, ...]`.
//!
//! A leaf `value` is written as a bare JSON primitive with `timestamp` as a
//! sibling field, not wrapped Compatible-TSON-style, since the operation's
//! own `timestamp` field already carries the timestamp the leaf gets. A
//! container `value` (a whole subtree added or replaced at once) has no
//! single timestamp to share that way, so it falls back to
//! `tson::codec::compatible`'s shape, which tags each of its own leaves.

use logument_pointer::{format_pointer, parse_pointer, Path};
use serde_json::{Map, Number, Value as Json};
use tson::codec::compatible;
use tson::{LeafValue, ParseError, Value, UNSPECIFIED_TIMESTAMP};

use crate::types::{Operation, Patch};

/// Serializes `patch` as TSON-Patch wire-format JSON text.
pub fn emit_patch(patch: &Patch) -> String {
    patch_to_json(patch).to_string()
}

/// Serializes `patch` as pretty-printed TSON-Patch wire-format JSON text.
pub fn emit_patch_pretty(patch: &Patch) -> String {
    serde_json::to_string_pretty(&patch_to_json(patch))
        .expect("serde_json::Value never fails to serialize")
}

/// Parses TSON-Patch wire-format JSON text into a [`Patch`].
pub fn parse_patch(text: &str) -> Result<Patch, ParseError> {
    let json: Json =
        serde_json::from_str(text).map_err(|e| ParseError::new(e.column(), e.to_string()))?;
    patch_from_json(&json)
}

/// Converts `patch` to its wire-format [`serde_json::Value`] (a JSON array).
pub fn patch_to_json(patch: &Patch) -> Json {
    Json::Array(patch.iter().map(operation_to_json).collect())
}

/// Parses a wire-format JSON array into a [`Patch`].
pub fn patch_from_json(json: &Json) -> Result<Patch, ParseError> {
    let arr = json
        .as_array()
        .ok_or_else(|| ParseError::new(0, "a patch must be a JSON array"))?;
    arr.iter().map(operation_from_json).collect()
}

fn operation_to_json(op: &Operation) -> Json {
    let mut obj = Map::new();
    obj.insert("op".to_string(), Json::String(op.op_name().to_string()));
    obj.insert(
        "path".to_string(),
        Json::String(format_pointer(op.path())),
    );
    match op {
        Operation::Add { value, timestamp, .. } | Operation::Replace { value, timestamp, .. } => {
            obj.insert("value".to_string(), value_to_wire_json(value));
            obj.insert("timestamp".to_string(), Json::Number(Number::from(*timestamp)));
        }
        Operation::Remove { timestamp, .. } => {
            obj.insert("timestamp".to_string(), Json::Number(Number::from(*timestamp)));
        }
        Operation::Move { from, timestamp, .. } | Operation::Copy { from, timestamp, .. } => {
            obj.insert("from".to_string(), Json::String(format_pointer(from)));
            obj.insert("timestamp".to_string(), Json::Number(Number::from(*timestamp)));
        }
        Operation::Test { value, .. } => {
            obj.insert("value".to_string(), value_to_wire_json(value));
            // `Test` carries no operation-level timestamp, but a leaf value's
            // own timestamp still needs a place on the wire now that it no
            // longer rides along inside a Compatible-TSON wrapper.
            if let Some(leaf) = value.as_leaf() {
                obj.insert("timestamp".to_string(), Json::Number(Number::from(leaf.timestamp)));
            }
        }
    }
    Json::Object(obj)
}

/// A leaf becomes a bare JSON primitive (its timestamp travels as the
/// operation's own sibling `timestamp` field instead); a container keeps
/// its Compatible-TSON shape, since its leaves carry their own timestamps.
fn value_to_wire_json(value: &Value) -> Json {
    match value {
        Value::Leaf(leaf) => leaf_value_to_json(&leaf.value),
        Value::Object(_) | Value::Array(_) => compatible::to_json(value),
    }
}

fn leaf_value_to_json(value: &LeafValue) -> Json {
    match value {
        LeafValue::String(s) => Json::String(s.clone()),
        LeafValue::Number(n) => Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        LeafValue::Bool(b) => Json::Bool(*b),
    }
}

fn operation_from_json(json: &Json) -> Result<Operation, ParseError> {
    let obj = json
        .as_object()
        .ok_or_else(|| ParseError::new(0, "an operation must be a JSON object"))?;
    let op_name = obj
        .get("op")
        .and_then(Json::as_str)
        .ok_or_else(|| ParseError::new(0, "operation is missing `op`"))?;
    let path: Path = obj
        .get("path")
        .and_then(Json::as_str)
        .map(parse_pointer)
        .ok_or_else(|| ParseError::new(0, "operation is missing `path`"))?;
    let timestamp = match obj.get("timestamp") {
        Some(Json::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ParseError::new(0, "timestamp must be an integer"))?,
        None => UNSPECIFIED_TIMESTAMP,
        _ => return Err(ParseError::new(0, "timestamp must be an integer")),
    };
    let value = |obj: &Map<String, Json>| -> Result<Value, ParseError> {
        let v = obj
            .get("value")
            .ok_or_else(|| ParseError::new(0, "operation is missing `value`"))?;
        value_from_wire_json(v, timestamp)
    };
    let from = |obj: &Map<String, Json>| -> Result<Path, ParseError> {
        obj.get("from")
            .and_then(Json::as_str)
            .map(parse_pointer)
            .ok_or_else(|| ParseError::new(0, "operation is missing `from`"))
    };
    match op_name {
        "add" => Ok(Operation::Add { path, value: value(obj)?, timestamp }),
        "replace" => Ok(Operation::Replace { path, value: value(obj)?, timestamp }),
        "remove" => Ok(Operation::Remove { path, timestamp }),
        "move" => Ok(Operation::Move { path, from: from(obj)?, timestamp }),
        "copy" => Ok(Operation::Copy { path, from: from(obj)?, timestamp }),
        "test" => Ok(Operation::Test { path, value: value(obj)? }),
        other => Err(ParseError::new(0, format!("unknown operation `{other}`"))),
    }
}

/// The counterpart to `value_to_wire_json`: a bare JSON primitive becomes a
/// leaf stamped with the operation's own `timestamp`; an object or array is
/// read back through `tson::codec::compatible`, which restores each leaf's
/// own embedded timestamp.
fn value_from_wire_json(json: &Json, timestamp: i64) -> Result<Value, ParseError> {
    match json {
        Json::String(s) => Ok(Value::string(s.clone(), timestamp)),
        Json::Number(n) => Ok(Value::number(
            n.as_f64()
                .ok_or_else(|| ParseError::new(0, "non-finite number in operation value"))?,
            timestamp,
        )),
        Json::Bool(b) => Ok(Value::bool(*b, timestamp)),
        Json::Object(_) | Json::Array(_) => compatible::from_json(json),
        Json::Null => Err(ParseError::new(0, "null is not a valid operation value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_wire_format_example() {
        let patch = vec![
            Operation::Replace {
                path: parse_pointer("/location/latitude"),
                value: Value::number(43.9409, 1_800_000_000),
                timestamp: 1_800_000_000,
            },
            Operation::Add {
                path: parse_pointer("/tirePressure/-"),
                value: Value::number(35.1, 1_900_000_000),
                timestamp: 1_900_000_000,
            },
            Operation::Remove {
                path: parse_pointer("/engineOn"),
                timestamp: 2_000_000_000,
            },
        ];
        let text = emit_patch(&patch);
        assert_eq!(parse_patch(&text).unwrap(), patch);
    }

    #[test]
    fn move_and_copy_round_trip_with_from() {
        let patch = vec![
            Operation::Move {
                path: parse_pointer("/b"),
                from: parse_pointer("/a"),
                timestamp: 1,
            },
            Operation::Copy {
                path: parse_pointer("/c"),
                from: parse_pointer("/b"),
                timestamp: 2,
            },
        ];
        let text = emit_patch(&patch);
        assert_eq!(parse_patch(&text).unwrap(), patch);
    }

    #[test]
    fn test_op_round_trips_without_timestamp() {
        let patch = vec![Operation::Test {
            path: parse_pointer("/speed"),
            value: Value::number(72.5, 10),
        }];
        let text = emit_patch(&patch);
        assert_eq!(parse_patch(&text).unwrap(), patch);
    }

    #[test]
    fn leaf_value_is_a_bare_primitive_on_the_wire() {
        let patch = vec![Operation::Replace {
            path: parse_pointer("/location/latitude"),
            value: Value::number(43.9409, 1_800_000_000),
            timestamp: 1_800_000_000,
        }];
        let json = patch_to_json(&patch);
        let op = &json.as_array().unwrap()[0];
        assert_eq!(op["value"], serde_json::json!(43.9409));
        assert_eq!(op["timestamp"], serde_json::json!(1_800_000_000));
    }

    #[test]
    fn parses_the_spec_wire_format_example_literally() {
        let text = r#"[
            {"op":"replace","path":"/location/latitude","value":43.9409,"timestamp":1800000000},
            {"op":"add","path":"/tirePressure/-","value":35.1,"timestamp":1900000000},
            {"op":"remove","path":"/engineOn","timestamp":2000000000}
        ]"#;
        let patch = parse_patch(text).unwrap();
        assert_eq!(patch.len(), 3);
        assert_eq!(
            patch[0],
            Operation::Replace {
                path: parse_pointer("/location/latitude"),
                value: Value::number(43.9409, 1_800_000_000),
                timestamp: 1_800_000_000,
            }
        );
    }

    #[test]
    fn rejects_unknown_op() {
        let text = r#"[{"op":"frobnicate","path":"/x"}]"#;
        assert!(parse_patch(text).is_err());
    }
}
