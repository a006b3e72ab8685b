//! Native TSON text encoder (the inverse of [`crate::parser`]).
//!
//! Mirrors `json-joy-json-pack::json::encoder`'s string-builder style:
//! append directly to a growing `String` rather than building an
//! intermediate tree of tokens.

use crate::model::{Leaf, LeafValue, Value};

/// Serializes `value` to native TSON text.
///
/// Object keys are emitted in their canonical (sorted) order. Every leaf's
/// timestamp is emitted using whichever placement its context calls for:
/// trailing the key in an object pair, leading the element in an array, and
/// trailing the value at the top level.
///
/// # Example
///
/// ```
/// use tson::codec::native::emit_native;
/// use tson::model::Value;
///
/// let doc = Value::object([("speed".to_string(), Value::number(72.5, 10))]);
/// assert_eq!(emit_native(&doc), r#"{"speed" <10>: 72.5}"#);
/// ```
pub fn emit_native(value: &Value) -> String {
    let mut out = String::new();
    write_standalone(&mut out, value);
    out
}

fn write_standalone(out: &mut String, value: &Value) {
    match value {
        Value::Leaf(leaf) => {
            write_primitive(out, &leaf.value);
            write_timestamp(out, leaf.timestamp);
        }
        Value::Object(_) | Value::Array(_) => write_container(out, value),
    }
}

fn write_container(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            out.push('{');
            for (i, (key, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                if let Value::Leaf(leaf) = v {
                    out.push(' ');
                    write_timestamp(out, leaf.timestamp);
                }
                out.push_str(": ");
                write_pair_or_elem_value(out, v);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Value::Leaf(leaf) = v {
                    write_timestamp(out, leaf.timestamp);
                    out.push(' ');
                }
                write_pair_or_elem_value(out, v);
            }
            out.push(']');
        }
        Value::Leaf(_) => unreachable!("write_container only called for Object/Array"),
    }
}

/// Writes a value that sits inside an object pair or array element, i.e.
/// with its timestamp (if any) already emitted by the caller.
fn write_pair_or_elem_value(out: &mut String, value: &Value) {
    match value {
        Value::Leaf(leaf) => write_primitive(out, &leaf.value),
        Value::Object(_) | Value::Array(_) => write_container(out, value),
    }
}

fn write_primitive(out: &mut String, value: &LeafValue) {
    match value {
        LeafValue::String(s) => write_string(out, s),
        LeafValue::Number(n) => out.push_str(&format_number(*n)),
        LeafValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    }
}

fn write_timestamp(out: &mut String, ts: i64) {
    out.push('<');
    if ts != crate::model::UNSPECIFIED_TIMESTAMP {
        out.push_str(&ts.to_string());
    }
    out.push('>');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn format_number(n: f64) -> String {
    if n == n.trunc() && n.is_finite() && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

/// Convenience: serializes a single [`Leaf`] as it would appear standalone.
pub fn emit_leaf(leaf: &Leaf) -> String {
    emit_native(&Value::Leaf(leaf.clone()))
}
