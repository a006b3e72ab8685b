//! Applying a [`Patch`] to a TSON document.
//!
//! Mirrors `json-joy::json_patch::apply`'s per-operation dispatch, built on
//! `tson::path`'s navigation primitives instead of `serde_json::Value`'s
//! own pointer methods.

use tson::{Value, path};

use crate::types::{Operation, Patch, PatchError};

/// Applies every operation in `patch` to `doc` in order and returns the
/// resulting document.
///
/// Applies atomically: on error, the input is left untouched and no
/// partial result is returned; callers that need an all-or-nothing
/// multi-version commit (e.g. an `Append`) rely on this.
pub fn apply(doc: &Value, patch: &[Operation]) -> Result<Value, PatchError> {
    let mut working = doc.clone();
    for op in patch {
        apply_one(&mut working, op)?;
    }
    Ok(working)
}

/// Applies a single operation in place.
pub fn apply_one(doc: &mut Value, op: &Operation) -> Result<(), PatchError> {
    match op {
        Operation::Add { path, value, .. } => {
            path::add(doc, path, value.clone())?;
            Ok(())
        }
        Operation::Remove { path, .. } => {
            path::remove(doc, path)?;
            Ok(())
        }
        Operation::Replace { path, value, .. } => {
            let old = path::get_value(doc, path)?;
            check_replace_kind(path, old, value)?;
            path::replace(doc, path, value.clone())?;
            Ok(())
        }
        Operation::Move { path: to, from, .. } => {
            if is_descendant(from, to) {
                return Err(PatchError::MoveIntoDescendant {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            let value = path::remove(doc, from)?;
            path::add(doc, to, value)?;
            Ok(())
        }
        Operation::Copy { path: to, from, .. } => {
            let value = path::get_value(doc, from)?.clone();
            path::add(doc, to, value)?;
            Ok(())
        }
        Operation::Test { path, value } => {
            let actual = path::get_value(doc, path)?;
            if actual.equal_without_timestamps(value) {
                Ok(())
            } else {
                Err(PatchError::TestFailed { path: path.clone() })
            }
        }
    }
}

/// `to` is `from` itself or nested under it — an invalid move target.
fn is_descendant(from: &[String], to: &[String]) -> bool {
    to.len() >= from.len() && to[..from.len()] == *from
}

/// Replacing a leaf with a value of a different primitive kind is a type
/// error; replacing a container (or a leaf with a container, or vice
/// versa) is an unrestricted structural edit.
fn check_replace_kind(path: &[String], old: &Value, new: &Value) -> Result<(), PatchError> {
    if let (Value::Leaf(old_leaf), Value::Leaf(new_leaf)) = (old, new) {
        if !old_leaf.value.same_kind(&new_leaf.value) {
            return Err(PatchError::TypeError {
                path: path.to_vec(),
                expected: old_leaf.value.kind_name(),
                found: new_leaf.value.kind_name(),
            });
        }
    }
    Ok(())
}
