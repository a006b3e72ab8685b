//! JSON-Pointer-style navigation and edit primitives over a TSON tree.
//!
//! Mirrors `json-joy-json-pointer`'s `find`/`get` free functions, adapted to
//! TSON's own `Object`/`Array`/`Leaf` variants (rather than `serde_json::Value`),
//! plus the mutation primitives `add`/`remove`/`replace` that TSON-Patch's
//! `apply` builds on.

use logument_pointer::{is_root, split_last};

use crate::error::PathError;
use crate::model::Value;

/// Resolves `path` against `root` and returns the subtree found there.
///
/// Against an `Object`, a segment is a key. Against an `Array`, a segment
/// must be a non-negative decimal index (`-` is only meaningful as the
/// final segment of an `Add` path, not for lookup). Against a `Leaf`, any
/// further segment is an error.
pub fn get_value<'a>(root: &'a Value, path: &[String]) -> Result<&'a Value, PathError> {
    if is_root(path) {
        return Ok(root);
    }
    let mut current = root;
    for (i, segment) in path.iter().enumerate() {
        current = step(current, segment, &path[..=i])?;
    }
    Ok(current)
}

fn step<'a>(current: &'a Value, segment: &str, path_so_far: &[String]) -> Result<&'a Value, PathError> {
    match current {
        Value::Object(map) => map.get(segment).ok_or_else(|| PathError::NotFound {
            path: path_so_far.to_vec(),
        }),
        Value::Array(arr) => {
            let idx = parse_index(segment, path_so_far)?;
            arr.get(idx).ok_or_else(|| PathError::IndexOutOfBounds {
                path: path_so_far.to_vec(),
                index: idx,
                len: arr.len(),
            })
        }
        Value::Leaf(_) => Err(PathError::IntoLeaf {
            path: path_so_far.to_vec(),
        }),
    }
}

fn parse_index(segment: &str, path_so_far: &[String]) -> Result<usize, PathError> {
    segment
        .parse::<usize>()
        .map_err(|_| PathError::InvalidArrayIndex {
            path: path_so_far.to_vec(),
            segment: segment.to_string(),
        })
}

/// Navigates to the mutable parent container of `path`'s final segment,
/// creating missing intermediate `Object`s along the way (for `Add`).
/// Missing intermediate `Array`s are an error: arrays must be explicitly
/// shaped by prior operations. A segment about to be auto-created is
/// rejected that way whenever the next segment looks like an array index
/// (a decimal number or `-`), since that shape can only belong to an
/// `Array` and only `Object`s may be auto-created.
fn navigate_parent_for_add<'a>(root: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PathError> {
    let parent_path = &path[..path.len() - 1];
    let mut current = root;
    for (i, segment) in parent_path.iter().enumerate() {
        let path_so_far = &parent_path[..=i];
        current = match current {
            Value::Object(map) => {
                if !map.contains_key(segment) && looks_like_array_index(&path[i + 1]) {
                    return Err(PathError::CannotCreateArray {
                        path: path_so_far.to_vec(),
                    });
                }
                map.entry(segment.clone()).or_insert_with(|| Value::Object(Default::default()))
            }
            Value::Array(arr) => {
                let idx = parse_index(segment, path_so_far)?;
                arr.get_mut(idx).ok_or_else(|| PathError::IndexOutOfBounds {
                    path: path_so_far.to_vec(),
                    index: idx,
                    len: arr.len(),
                })?
            }
            Value::Leaf(_) => {
                return Err(PathError::IntoLeaf {
                    path: path_so_far.to_vec(),
                })
            }
        };
    }
    Ok(current)
}

fn looks_like_array_index(segment: &str) -> bool {
    segment == "-" || segment.parse::<usize>().is_ok()
}

/// Navigates to the mutable parent container of `path`'s final segment,
/// requiring every intermediate step to already exist (for `Replace`/`Remove`).
fn navigate_parent_existing<'a>(
    root: &'a mut Value,
    parent_path: &[String],
) -> Result<&'a mut Value, PathError> {
    let mut current = root;
    for (i, segment) in parent_path.iter().enumerate() {
        let path_so_far = &parent_path[..=i];
        current = match current {
            Value::Object(map) => {
                map.get_mut(segment).ok_or_else(|| PathError::NotFound {
                    path: path_so_far.to_vec(),
                })?
            }
            Value::Array(arr) => {
                let idx = parse_index(segment, path_so_far)?;
                arr.get_mut(idx).ok_or_else(|| PathError::IndexOutOfBounds {
                    path: path_so_far.to_vec(),
                    index: idx,
                    len: arr.len(),
                })?
            }
            Value::Leaf(_) => {
                return Err(PathError::IntoLeaf {
                    path: path_so_far.to_vec(),
                })
            }
        };
    }
    Ok(current)
}

/// Adds `value` at `path` (the `Add` operation).
///
/// At the root, replaces the whole document. Against an `Object` parent,
/// inserts or overwrites the key. Against an `Array` parent, `-` appends
/// and any other segment must be a valid insertion index (`0..=len`).
/// Missing intermediate `Object`s are created; missing intermediate
/// `Array`s are an error.
pub fn add(root: &mut Value, path: &[String], value: Value) -> Result<(), PathError> {
    if is_root(path) {
        *root = value;
        return Ok(());
    }
    let (parent_path, key) = split_last(path).expect("non-root path has a last segment");
    let parent = navigate_parent_for_add(root, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(key, value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                return Ok(());
            }
            let idx = parse_index(&key, path)?;
            if idx > arr.len() {
                return Err(PathError::IndexOutOfBounds {
                    path: path.to_vec(),
                    index: idx,
                    len: arr.len(),
                });
            }
            arr.insert(idx, value);
            Ok(())
        }
        Value::Leaf(_) => Err(PathError::IntoLeaf {
            path: parent_path,
        }),
    }
}

/// Removes and returns the value at `path` (the `Remove` operation).
///
/// Removing an `Array` element shifts subsequent indices down.
pub fn remove(root: &mut Value, path: &[String]) -> Result<Value, PathError> {
    if is_root(path) {
        return Err(PathError::NotFound { path: path.to_vec() });
    }
    let (parent_path, key) = split_last(path).expect("non-root path has a last segment");
    let parent = navigate_parent_existing(root, &parent_path)?;
    match parent {
        Value::Object(map) => map.remove(&key).ok_or_else(|| PathError::NotFound {
            path: path.to_vec(),
        }),
        Value::Array(arr) => {
            let idx = parse_index(&key, path)?;
            if idx >= arr.len() {
                return Err(PathError::IndexOutOfBounds {
                    path: path.to_vec(),
                    index: idx,
                    len: arr.len(),
                });
            }
            Ok(arr.remove(idx))
        }
        Value::Leaf(_) => Err(PathError::IntoLeaf { path: parent_path }),
    }
}

/// Overwrites the existing value at `path` with `value`, returning the old
/// value (the `Replace` operation; the caller is responsible for the
/// leaf-kind-match check, since that requires the `Operation`'s own error
/// type — see `tson_patch::apply`).
pub fn replace(root: &mut Value, path: &[String], value: Value) -> Result<Value, PathError> {
    if is_root(path) {
        return Ok(std::mem::replace(root, value));
    }
    let (parent_path, key) = split_last(path).expect("non-root path has a last segment");
    let parent = navigate_parent_existing(root, &parent_path)?;
    match parent {
        Value::Object(map) => {
            let slot = map.get_mut(&key).ok_or_else(|| PathError::NotFound {
                path: path.to_vec(),
            })?;
            Ok(std::mem::replace(slot, value))
        }
        Value::Array(arr) => {
            let idx = parse_index(&key, path)?;
            let slot = arr.get_mut(idx).ok_or_else(|| PathError::IndexOutOfBounds {
                path: path.to_vec(),
                index: idx,
                len: arr.len(),
            })?;
            Ok(std::mem::replace(slot, value))
        }
        Value::Leaf(_) => Err(PathError::IntoLeaf { path: parent_path }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logument_pointer::parse_pointer;

    fn doc() -> Value {
        Value::object([
            ("speed".to_string(), Value::number(72.5, 10)),
            (
                "tirePressure".to_string(),
                Value::array([Value::number(32.0, 10), Value::number(33.0, 10)]),
            ),
        ])
    }

    #[test]
    fn get_value_root_returns_whole_tree() {
        let d = doc();
        assert_eq!(get_value(&d, &[]).unwrap(), &d);
    }

    #[test]
    fn get_value_resolves_object_key() {
        let d = doc();
        let v = get_value(&d, &parse_pointer("/speed")).unwrap();
        assert_eq!(v, &Value::number(72.5, 10));
    }

    #[test]
    fn get_value_resolves_array_index() {
        let d = doc();
        let v = get_value(&d, &parse_pointer("/tirePressure/1")).unwrap();
        assert_eq!(v, &Value::number(33.0, 10));
    }

    #[test]
    fn get_value_missing_key_errors() {
        let d = doc();
        assert!(get_value(&d, &parse_pointer("/missing")).is_err());
    }

    #[test]
    fn get_value_into_leaf_errors() {
        let d = doc();
        assert!(get_value(&d, &parse_pointer("/speed/x")).is_err());
    }

    #[test]
    fn add_creates_missing_intermediate_objects() {
        let mut d = Value::object([]);
        add(
            &mut d,
            &parse_pointer("/location/latitude"),
            Value::number(43.9, 20),
        )
        .unwrap();
        let v = get_value(&d, &parse_pointer("/location/latitude")).unwrap();
        assert_eq!(v, &Value::number(43.9, 20));
    }

    #[test]
    fn add_array_dash_appends() {
        let mut d = doc();
        add(&mut d, &parse_pointer("/tirePressure/-"), Value::number(35.1, 30)).unwrap();
        let arr = get_value(&d, &parse_pointer("/tirePressure")).unwrap();
        assert_eq!(arr.as_array().unwrap().len(), 3);
    }

    #[test]
    fn add_into_missing_array_errors() {
        let mut d = Value::object([]);
        let res = add(&mut d, &parse_pointer("/arr/0"), Value::number(1.0, 1));
        assert!(res.is_err());
    }

    #[test]
    fn add_into_missing_array_dash_errors() {
        let mut d = Value::object([]);
        let res = add(&mut d, &parse_pointer("/arr/-"), Value::number(1.0, 1));
        assert!(res.is_err());
    }

    #[test]
    fn remove_shifts_array_indices() {
        let mut d = doc();
        remove(&mut d, &parse_pointer("/tirePressure/0")).unwrap();
        let arr = get_value(&d, &parse_pointer("/tirePressure")).unwrap();
        assert_eq!(arr.as_array().unwrap(), &vec![Value::number(33.0, 10)]);
    }

    #[test]
    fn replace_requires_existing_path() {
        let mut d = Value::object([]);
        let res = replace(&mut d, &parse_pointer("/speed"), Value::number(1.0, 1));
        assert!(res.is_err());
    }

    #[test]
    fn replace_overwrites_and_returns_old() {
        let mut d = doc();
        let old = replace(&mut d, &parse_pointer("/speed"), Value::number(80.0, 30)).unwrap();
        assert_eq!(old, Value::number(72.5, 10));
        assert_eq!(
            get_value(&d, &parse_pointer("/speed")).unwrap(),
            &Value::number(80.0, 30)
        );
    }
}
