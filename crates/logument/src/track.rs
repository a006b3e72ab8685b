//! `Track`, `TemporalTrack`, `Compact`, and `History`: operations that
//! collapse a run of writes at the same path down to the ones that actually
//! changed the value, the way a sensor feed that repeats its last reading
//! every cycle should not leave one patch entry per cycle.
//!
//! Grounded on the same fold-over-`BTreeMap<version, Patch>` shape
//! `engine.rs` uses for `Snapshot`, rather than on anything in
//! `json_crdt::log::Log` — that log has no value-equality notion to compact
//! against, since CRDT operations are not simple overwrites.

use std::collections::{BTreeMap, HashMap};

use logument_pointer::Path;
use tson_patch::{Operation, Patch};

use crate::engine::{operation_value, Logument};
use crate::error::LogumentError;

impl Logument {
    /// Recomputes `patches[vi+1..=vj]` with repeated, value-identical writes
    /// at the same path collapsed away, writes the result back into
    /// `self.patches` (so a later `Track` over the same range is a no-op),
    /// and returns the (possibly now-empty) per-version patches.
    pub fn track(&mut self, vi: u64, vj: u64) -> Result<BTreeMap<u64, Patch>, LogumentError> {
        if vi > vj {
            return Err(LogumentError::RangeError(format!(
                "track start {vi} exceeds end {vj}"
            )));
        }
        let n = self.latest_version();
        if vj > n {
            return Err(LogumentError::RangeError(format!(
                "track end {vj} exceeds latest version {n}"
            )));
        }
        let ordered: Vec<(u64, Patch)> = ((vi + 1)..=vj)
            .filter_map(|v| self.patches.get(&v).map(|p| (v, p.clone())))
            .collect();
        let compacted = compact_ops(ordered);
        for (v, patch) in &compacted {
            self.patches.insert(*v, patch.clone());
        }
        Ok(compacted)
    }

    /// Like [`Logument::track`], but scoped by timestamp range: each
    /// version's patch is first filtered to operations whose timestamp
    /// falls in `[tsi, tsj]`, then compacted. Versions left with no
    /// surviving operations are dropped from the result entirely, rather
    /// than kept as empty entries (unlike [`Logument::track`], which writes
    /// its compacted result, empty patches included, back into
    /// `self.patches`) — this result is a read-only view over a timestamp
    /// window, not the full per-version history, so there is nothing
    /// meaningful to write back.
    pub fn temporal_track(&mut self, tsi: i64, tsj: i64) -> Result<BTreeMap<u64, Patch>, LogumentError> {
        if tsi > tsj {
            return Err(LogumentError::RangeError(format!(
                "temporal track start {tsi} exceeds end {tsj}"
            )));
        }
        let n = self.latest_version();
        let ordered: Vec<(u64, Patch)> = (1..=n)
            .filter_map(|v| {
                self.patches.get(&v).map(|p| {
                    let filtered: Patch = p
                        .iter()
                        .filter(|op| op.timestamp().map_or(false, |t| t >= tsi && t <= tsj))
                        .cloned()
                        .collect();
                    (v, filtered)
                })
            })
            .filter(|(_, p)| !p.is_empty())
            .collect();
        let compacted = compact_ops(ordered);
        Ok(compacted.into_iter().filter(|(_, p)| !p.is_empty()).collect())
    }

    /// Compacts `patches` in place, scoped to operations whose path falls
    /// at or under `target_path`. Operations outside that scope pass
    /// through untouched.
    pub fn compact(&mut self, target_path: &[String]) {
        let versions: Vec<u64> = self.patches.keys().cloned().collect();
        let mut last_value: HashMap<Path, tson::Value> = HashMap::new();
        for v in versions {
            let ops = self.patches.get(&v).cloned().unwrap_or_default();
            let mut kept = Vec::with_capacity(ops.len());
            for op in ops {
                if !path_starts_with(target_path, op.path()) {
                    kept.push(op);
                    continue;
                }
                match operation_value(&op) {
                    Some(new_value) => {
                        let path = op.path().clone();
                        let changed = last_value
                            .get(&path)
                            .map_or(true, |old| !old.equal_without_timestamps(new_value));
                        if changed {
                            last_value.insert(path, new_value.clone());
                            kept.push(op);
                        }
                    }
                    None => {
                        if matches!(op, Operation::Remove { .. }) {
                            last_value.remove(op.path());
                        }
                        kept.push(op);
                    }
                }
            }
            self.patches.insert(v, kept);
        }
    }

    /// The chronological write history of every leaf path at or under
    /// `target_path`, after compacting `target_path`'s own run of
    /// value-identical writes away. Each path's sequence is prepended with
    /// a synthetic `Add` carrying its value in `snapshots[0]` (timestamp
    /// `0`) when such a value exists there.
    pub fn history(&mut self, target_path: &[String]) -> Result<BTreeMap<Path, Patch>, LogumentError> {
        self.compact(target_path);
        let mut by_path: BTreeMap<Path, Patch> = BTreeMap::new();
        for v in 1..=self.latest_version() {
            if let Some(patch) = self.patches.get(&v) {
                for op in patch {
                    if path_starts_with(target_path, op.path()) {
                        by_path.entry(op.path().clone()).or_default().push(op.clone());
                    }
                }
            }
        }
        let snapshot0 = self.snapshots[&0].clone();
        for (path, ops) in by_path.iter_mut() {
            if let Ok(initial) = tson::path::get_value(&snapshot0, path) {
                if initial.is_leaf() {
                    ops.insert(
                        0,
                        Operation::Add {
                            path: path.clone(),
                            value: initial.clone(),
                            timestamp: 0,
                        },
                    );
                }
            }
        }
        Ok(by_path)
    }
}

/// `path` is `target` itself or falls anywhere under it.
fn path_starts_with(target: &[String], path: &[String]) -> bool {
    path.len() >= target.len() && path[..target.len()] == *target
}

/// Keeps only the operations in `ordered` that change the value at their
/// path relative to the last *kept* value at that exact path — a path's
/// first occurrence is always kept. Only `Add`/`Replace`/`Test` carry an
/// inline value to compare (via [`operation_value`]); everything else
/// (`Remove`, `Move`, `Copy`) is always preserved as-is, since collapsing a
/// structural edit would require materializing intermediate state this
/// function never sees. `Remove` clears the tracked value at its path, so a
/// later re-`Add` of the same prior value still counts as a genuine change.
fn compact_ops(ordered: impl IntoIterator<Item = (u64, Patch)>) -> BTreeMap<u64, Patch> {
    let mut last_value: HashMap<Path, tson::Value> = HashMap::new();
    let mut out = BTreeMap::new();
    for (v, ops) in ordered {
        let mut kept = Vec::with_capacity(ops.len());
        for op in ops {
            match operation_value(&op) {
                Some(new_value) => {
                    let path = op.path().clone();
                    let changed = last_value
                        .get(&path)
                        .map_or(true, |old| !old.equal_without_timestamps(new_value));
                    if changed {
                        last_value.insert(path, new_value.clone());
                        kept.push(op);
                    }
                }
                None => {
                    if matches!(op, Operation::Remove { .. }) {
                        last_value.remove(op.path());
                    }
                    kept.push(op);
                }
            }
        }
        out.insert(v, kept);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use logument_pointer::parse_pointer;
    use tson::Value;

    // ── Scenario 3: Compact eliminates repeated identical writes ──────────

    #[test]
    fn compact_eliminates_repeated_identical_writes() {
        let mut log = Logument::new(Value::object([("a".to_string(), Value::number(0.0, 0))]));
        for ts in [1, 2, 3] {
            log.store(vec![Operation::Replace {
                path: parse_pointer("/a"),
                value: Value::number(5.0, ts),
                timestamp: ts,
            }]);
            log.append().unwrap();
        }
        log.compact(&parse_pointer("/a"));
        let total_ops: usize = log.patches.values().map(Vec::len).sum();
        assert_eq!(total_ops, 1);
        assert!(matches!(
            log.patches[&1][0],
            Operation::Replace { timestamp: 1, .. }
        ));
        assert!(log.patches[&2].is_empty());
        assert!(log.patches[&3].is_empty());
    }

    #[test]
    fn compact_only_touches_the_target_path() {
        let mut log = Logument::new(Value::object([
            ("a".to_string(), Value::number(0.0, 0)),
            ("b".to_string(), Value::number(0.0, 0)),
        ]));
        log.store(vec![
            Operation::Replace {
                path: parse_pointer("/a"),
                value: Value::number(5.0, 1),
                timestamp: 1,
            },
            Operation::Replace {
                path: parse_pointer("/b"),
                value: Value::number(9.0, 1),
                timestamp: 1,
            },
        ]);
        log.append().unwrap();
        log.store(vec![
            Operation::Replace {
                path: parse_pointer("/a"),
                value: Value::number(5.0, 2),
                timestamp: 2,
            },
            Operation::Replace {
                path: parse_pointer("/b"),
                value: Value::number(10.0, 2),
                timestamp: 2,
            },
        ]);
        log.append().unwrap();

        log.compact(&parse_pointer("/a"));
        assert_eq!(log.patches[&1].len(), 2);
        assert_eq!(log.patches[&2].len(), 1);
        assert!(matches!(
            log.patches[&2][0],
            Operation::Replace { timestamp: 2, .. }
        ));
    }

    // ── Scenario 6: History with initial value ─────────────────────────────

    #[test]
    fn history_prepends_initial_value_and_compacts_middle_write() {
        let mut log = Logument::new(Value::object([(
            "loc".to_string(),
            Value::string("A", 0),
        )]));
        for (value, ts) in [("B", 10), ("B", 20), ("C", 30)] {
            log.store(vec![Operation::Replace {
                path: parse_pointer("/loc"),
                value: Value::string(value, ts),
                timestamp: ts,
            }]);
            log.append().unwrap();
        }

        let history = log.history(&parse_pointer("/loc")).unwrap();
        let ops = &history[&parse_pointer("/loc")];
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], Operation::Add { timestamp: 0, .. }));
        assert!(matches!(ops[1], Operation::Replace { timestamp: 10, .. }));
        assert!(matches!(ops[2], Operation::Replace { timestamp: 30, .. }));
    }

    #[test]
    fn history_omits_synthetic_add_when_path_has_no_initial_value() {
        let mut log = Logument::new(Value::object([]));
        log.store(vec![Operation::Add {
            path: parse_pointer("/loc"),
            value: Value::string("A", 5),
            timestamp: 5,
        }]);
        log.append().unwrap();

        let history = log.history(&parse_pointer("/loc")).unwrap();
        let ops = &history[&parse_pointer("/loc")];
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Operation::Add { timestamp: 5, .. }));
    }

    // ── Track / TemporalTrack ───────────────────────────────────────────────

    #[test]
    fn track_writes_compacted_result_back_into_patches() {
        let mut log = Logument::new(Value::object([("a".to_string(), Value::number(0.0, 0))]));
        for ts in [1, 2, 3] {
            log.store(vec![Operation::Replace {
                path: parse_pointer("/a"),
                value: Value::number(5.0, ts),
                timestamp: ts,
            }]);
            log.append().unwrap();
        }
        let tracked = log.track(0, 3).unwrap();
        assert_eq!(tracked[&1].len(), 1);
        assert!(tracked[&2].is_empty());
        assert!(tracked[&3].is_empty());
        // Idempotent: tracking again changes nothing further.
        let tracked_again = log.track(0, 3).unwrap();
        assert_eq!(tracked, tracked_again);
    }

    #[test]
    fn temporal_track_drops_versions_with_no_surviving_ops() {
        let mut log = Logument::new(Value::object([("a".to_string(), Value::number(0.0, 0))]));
        log.store(vec![Operation::Replace {
            path: parse_pointer("/a"),
            value: Value::number(1.0, 100),
            timestamp: 100,
        }]);
        log.append().unwrap();
        log.store(vec![Operation::Replace {
            path: parse_pointer("/a"),
            value: Value::number(2.0, 200),
            timestamp: 200,
        }]);
        log.append().unwrap();

        let tracked = log.temporal_track(0, 150).unwrap();
        assert_eq!(tracked.len(), 1);
        assert!(tracked.contains_key(&1));
        assert!(!tracked.contains_key(&2));
    }
}
