//! The Logument wire format: a single JSON object carrying the version
//! list, memoized snapshots, per-version patches, and (if non-empty) the
//! staged pool — enough to reconstruct an engine exactly, `metadata` aside.
//!
//! Layered the same way `tson_patch::codec` sits over `tson::codec::compatible`:
//! this module embeds Compatible-TSON values and TSON-Patch arrays inside a
//! larger JSON object rather than re-deriving their grammars.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use tson::codec::compatible;
use tson::ParseError;
use tson_patch::codec::{patch_from_json, patch_to_json};

use crate::engine::Logument;
use crate::error::LogumentError;

/// Converts `log` to its wire-format [`serde_json::Value`].
///
/// `metadata` is deliberately not part of the wire form: it is a local
/// annotation, not part of the document's recoverable state.
pub fn to_wire_json(log: &Logument) -> Json {
    let mut obj = Map::new();
    obj.insert(
        "version".to_string(),
        Json::Array(log.versions.iter().map(|v| Json::from(*v)).collect()),
    );
    let mut snapshots = Map::new();
    for (v, snap) in &log.snapshots {
        snapshots.insert(v.to_string(), compatible::to_json(snap));
    }
    obj.insert("snapshots".to_string(), Json::Object(snapshots));
    let mut patches = Map::new();
    for (v, patch) in &log.patches {
        patches.insert(v.to_string(), patch_to_json(patch));
    }
    obj.insert("patches".to_string(), Json::Object(patches));
    if !log.pool.is_empty() {
        obj.insert("patch_pool".to_string(), patch_to_json(&log.pool));
    }
    Json::Object(obj)
}

/// Parses a wire-format [`serde_json::Value`] into a [`Logument`].
pub fn from_wire_json(json: &Json) -> Result<Logument, LogumentError> {
    let obj = json
        .as_object()
        .ok_or_else(|| ParseError::new(0, "a Logument document must be a JSON object"))?;

    let versions: Vec<u64> = obj
        .get("version")
        .and_then(Json::as_array)
        .ok_or_else(|| ParseError::new(0, "document is missing `version`"))?
        .iter()
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| ParseError::new(0, "`version` entries must be non-negative integers"))
        })
        .collect::<Result<_, _>>()?;

    let mut snapshots = BTreeMap::new();
    let snapshots_obj = obj
        .get("snapshots")
        .and_then(Json::as_object)
        .ok_or_else(|| ParseError::new(0, "document is missing `snapshots`"))?;
    for (k, v) in snapshots_obj {
        let version = parse_version_key(k)?;
        snapshots.insert(version, compatible::from_json(v)?);
    }
    if !snapshots.contains_key(&0) {
        return Err(LogumentError::InvariantViolation(
            "wire document is missing snapshots[0]".to_string(),
        ));
    }

    let mut patches = BTreeMap::new();
    let patches_obj = obj
        .get("patches")
        .and_then(Json::as_object)
        .ok_or_else(|| ParseError::new(0, "document is missing `patches`"))?;
    for (k, v) in patches_obj {
        let version = parse_version_key(k)?;
        patches.insert(version, patch_from_json(v)?);
    }

    let pool = match obj.get("patch_pool") {
        Some(v) => patch_from_json(v)?,
        None => Vec::new(),
    };

    let log = Logument {
        versions,
        snapshots,
        patches,
        pool,
        metadata: BTreeMap::new(),
    };
    if !log.is_continuous() {
        return Err(LogumentError::InvariantViolation(
            "wire document's `version` list is not [0, 1, …, N]".to_string(),
        ));
    }
    Ok(log)
}

fn parse_version_key(key: &str) -> Result<u64, ParseError> {
    key.parse::<u64>()
        .map_err(|_| ParseError::new(0, format!("`{key}` is not a valid version key")))
}

/// Serializes `log` as wire-format JSON text.
pub fn emit_wire(log: &Logument) -> String {
    to_wire_json(log).to_string()
}

/// Serializes `log` as pretty-printed wire-format JSON text.
pub fn emit_wire_pretty(log: &Logument) -> String {
    serde_json::to_string_pretty(&to_wire_json(log)).expect("serde_json::Value never fails to serialize")
}

/// Parses wire-format JSON text into a [`Logument`].
pub fn parse_wire(text: &str) -> Result<Logument, LogumentError> {
    let json: Json = serde_json::from_str(text).map_err(|e| ParseError::new(e.column(), e.to_string()))?;
    from_wire_json(&json)
}
