//! Structural diff between two TSON documents.
//!
//! Mirrors `json-joy::json_patch_diff::diff_at_path`'s key-union object
//! diff and prefix/suffix-trimmed array diff, adapted to TSON's
//! `Object`/`Array`/`Leaf` shape and its timestamp-aware equality.

use tson::{LeafValue, Value};

use crate::types::Operation;

/// Produces the minimal patch that turns `origin` into `modified`,
/// ignoring timestamp-only changes: if two leaves hold equal values but
/// different timestamps, no operation is emitted.
///
/// `apply(origin, diff(origin, modified))` is structurally equal to
/// `modified`.
pub fn diff(origin: &Value, modified: &Value) -> Vec<Operation> {
    let mut ops = Vec::new();
    diff_at(&mut ops, &[], origin, modified, false);
    ops
}

/// Like [`diff`], but also emits a `Replace` whenever a leaf's timestamp
/// changed, even if its value did not.
pub fn diff_with_timestamps(origin: &Value, modified: &Value) -> Vec<Operation> {
    let mut ops = Vec::new();
    diff_at(&mut ops, &[], origin, modified, true);
    ops
}

fn diff_at(ops: &mut Vec<Operation>, path: &[String], origin: &Value, modified: &Value, track_ts: bool) {
    match (origin, modified) {
        (Value::Leaf(o), Value::Leaf(m)) => {
            if o.value != m.value {
                ops.push(Operation::Replace {
                    path: path.to_vec(),
                    value: modified.clone(),
                    timestamp: m.timestamp,
                });
            } else if track_ts && o.timestamp != m.timestamp {
                ops.push(Operation::Replace {
                    path: path.to_vec(),
                    value: modified.clone(),
                    timestamp: m.timestamp,
                });
            }
        }
        (Value::Object(o), Value::Object(m)) => diff_object(ops, path, o, m, track_ts),
        (Value::Array(o), Value::Array(m)) => diff_array(ops, path, o, m, track_ts),
        _ => {
            // Kind changed (e.g. leaf became an object): wholesale replace.
            ops.push(Operation::Replace {
                path: path.to_vec(),
                value: modified.clone(),
                timestamp: modified.latest_timestamp(),
            });
        }
    }
}

fn diff_object(
    ops: &mut Vec<Operation>,
    path: &[String],
    origin: &std::collections::BTreeMap<String, Value>,
    modified: &std::collections::BTreeMap<String, Value>,
    track_ts: bool,
) {
    for key in origin.keys() {
        if !modified.contains_key(key) {
            let mut p = path.to_vec();
            p.push(key.clone());
            ops.push(Operation::Remove {
                timestamp: origin[key].latest_timestamp(),
                path: p,
            });
        }
    }
    for (key, m_val) in modified {
        let mut p = path.to_vec();
        p.push(key.clone());
        match origin.get(key) {
            None => ops.push(Operation::Add {
                path: p,
                value: m_val.clone(),
                timestamp: m_val.latest_timestamp(),
            }),
            Some(o_val) => diff_at(ops, &p, o_val, m_val, track_ts),
        }
    }
}

fn diff_array(
    ops: &mut Vec<Operation>,
    path: &[String],
    origin: &[Value],
    modified: &[Value],
    track_ts: bool,
) {
    // Trim the common prefix and suffix so only the changed middle section
    // produces operations.
    let mut prefix = 0;
    while prefix < origin.len()
        && prefix < modified.len()
        && origin[prefix].equal_without_timestamps(&modified[prefix])
        && (!track_ts || origin[prefix] == modified[prefix])
    {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < origin.len() - prefix
        && suffix < modified.len() - prefix
        && origin[origin.len() - 1 - suffix].equal_without_timestamps(&modified[modified.len() - 1 - suffix])
        && (!track_ts || origin[origin.len() - 1 - suffix] == modified[modified.len() - 1 - suffix])
    {
        suffix += 1;
    }

    let origin_mid = &origin[prefix..origin.len() - suffix];
    let modified_mid = &modified[prefix..modified.len() - suffix];

    if origin_mid.is_empty() && modified_mid.is_empty() {
        return;
    }

    let overlap = origin_mid.len().min(modified_mid.len());
    for i in 0..overlap {
        let mut p = path.to_vec();
        p.push((prefix + i).to_string());
        diff_at(ops, &p, &origin_mid[i], &modified_mid[i], track_ts);
    }

    // Remove any leftover origin elements from the tail first, so that
    // indices of not-yet-processed elements don't shift underneath us.
    for i in (overlap..origin_mid.len()).rev() {
        let mut p = path.to_vec();
        p.push((prefix + i).to_string());
        ops.push(Operation::Remove {
            timestamp: origin_mid[i].latest_timestamp(),
            path: p,
        });
    }
    // Insert at each element's real index (not a tail append): when the
    // arrays share a common suffix, a tail `-` append would land the new
    // elements after it instead of where they actually belong.
    for (k, item) in modified_mid.iter().skip(overlap).enumerate() {
        let mut p = path.to_vec();
        p.push((prefix + overlap + k).to_string());
        ops.push(Operation::Add {
            path: p,
            value: item.clone(),
            timestamp: item.latest_timestamp(),
        });
    }
}

/// Re-exported for callers that only need to check a leaf's primitive kind
/// while reviewing a diff (e.g. the CLI).
pub fn leaf_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::Leaf(l) => Some(match &l.value {
            LeafValue::String(_) => "string",
            LeafValue::Number(_) => "number",
            LeafValue::Bool(_) => "bool",
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply;

    #[test]
    fn diff_of_equal_docs_is_empty() {
        let v = Value::number(1.0, 10);
        assert!(diff(&v, &v).is_empty());
    }

    #[test]
    fn diff_ignores_timestamp_only_change_by_default() {
        let a = Value::number(1.0, 10);
        let b = Value::number(1.0, 20);
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn diff_with_timestamps_emits_replace_on_timestamp_change() {
        let a = Value::number(1.0, 10);
        let b = Value::number(1.0, 20);
        let ops = diff_with_timestamps(&a, &b);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op_name(), "replace");
    }

    #[test]
    fn diff_detects_value_change() {
        let a = Value::number(1.0, 10);
        let b = Value::number(2.0, 20);
        let ops = diff(&a, &b);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op_name(), "replace");
    }

    #[test]
    fn diff_object_add_remove_and_recurse() {
        let a = Value::object([
            ("a".to_string(), Value::number(1.0, 1)),
            ("b".to_string(), Value::number(2.0, 1)),
        ]);
        let b = Value::object([
            ("a".to_string(), Value::number(1.0, 1)),
            ("c".to_string(), Value::number(3.0, 1)),
        ]);
        let ops = diff(&a, &b);
        let result = apply(&a, &ops).unwrap();
        assert!(result.equal_without_timestamps(&b));
    }

    #[test]
    fn diff_array_insert_and_roundtrip() {
        let a = Value::array([Value::number(1.0, 1), Value::number(2.0, 1), Value::number(3.0, 1)]);
        let b = Value::array([
            Value::number(1.0, 1),
            Value::number(99.0, 2),
            Value::number(2.0, 1),
            Value::number(3.0, 1),
        ]);
        let ops = diff(&a, &b);
        let result = apply(&a, &ops).unwrap();
        assert!(result.equal_without_timestamps(&b));
    }

    #[test]
    fn diff_array_delete_and_roundtrip() {
        let a = Value::array([Value::number(1.0, 1), Value::number(2.0, 1), Value::number(3.0, 1)]);
        let b = Value::array([Value::number(1.0, 1), Value::number(3.0, 1)]);
        let ops = diff(&a, &b);
        let result = apply(&a, &ops).unwrap();
        assert!(result.equal_without_timestamps(&b));
    }

    #[test]
    fn diff_nested_object_round_trips() {
        let a = Value::object([(
            "loc".to_string(),
            Value::object([("lat".to_string(), Value::number(1.0, 1))]),
        )]);
        let b = Value::object([(
            "loc".to_string(),
            Value::object([("lat".to_string(), Value::number(2.0, 2))]),
        )]);
        let ops = diff(&a, &b);
        let result = apply(&a, &ops).unwrap();
        assert!(result.equal_without_timestamps(&b));
    }
}
