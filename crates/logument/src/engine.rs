//! The `Logument` engine: a versioned, append-only log of TSON patches with
//! lazily-materialized, memoized snapshots.
//!
//! Mirrors `json_crdt::log::Log`'s shape — a seeded baseline, a `BTreeMap`
//! of recorded history, and a current state folded from it on demand — but
//! generalized from a CRDT model with a session clock to a plain TSON tree
//! with caller-supplied timestamps. There is no `start_fn` factory closure
//! here: `snapshots[0]` is stored directly, since TSON has no CRDT op log to
//! replay from an empty baseline.

use std::collections::BTreeMap;

use tson::{Value, UNSPECIFIED_TIMESTAMP};
use tson_patch::{Operation, Patch};

use crate::error::LogumentError;

/// A versioned, temporal document store over TSON.
///
/// `versions` is the ordered list of committed version numbers, always
/// `[0, 1, …, N]` for this engine's own invariant (checked by
/// [`Logument::is_continuous`], never enforced by sorting — see the
/// `versions` field's own doc comment). `snapshots` is a sparse memoization
/// cache: it always contains key `0` and may contain any subset of
/// `1..=N`, since every snapshot is derivable by folding `patches` over an
/// earlier one. `patches[v]` are the operations that turn
/// `snapshot_at(v-1)` into `snapshot_at(v)`. `pool` holds operations staged
/// for the as-yet-uncommitted version `N+1`.
#[derive(Debug, Clone)]
pub struct Logument {
    /// Committed version numbers. Treated as already sorted: unlike the
    /// implementation this engine is modeled on (which sorts `versions` as
    /// a side effect of its continuity check), `is_continuous` only
    /// verifies.
    pub versions: Vec<u64>,

    /// Memoized snapshots, sparse except for the seeded key `0`. Grows
    /// without a built-in eviction policy; production deployments that
    /// query many distinct versions should add an LRU in front of
    /// [`Logument::snapshot`].
    pub snapshots: BTreeMap<u64, Value>,

    /// Patches recorded per version: `patches[v]` transforms
    /// `snapshot_at(v-1)` into `snapshot_at(v)`.
    pub patches: BTreeMap<u64, Patch>,

    /// Operations staged for the next, not-yet-committed version.
    pub pool: Patch,

    /// Caller-attached key/value annotations (e.g. a device ID, a log
    /// rotation marker). Purely additive; never interpreted by the engine
    /// and not part of the persisted wire form.
    pub metadata: BTreeMap<String, String>,
}

impl Logument {
    /// Creates a new engine seeded with `initial` as `snapshots[0]`.
    pub fn new(initial: Value) -> Self {
        let mut snapshots = BTreeMap::new();
        snapshots.insert(0, initial);
        Self {
            versions: vec![0],
            snapshots,
            patches: BTreeMap::new(),
            pool: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Creates a new engine seeded with `initial`, with `pool` staged
    /// immediately (not yet promoted to a version).
    pub fn with_initial_pool(initial: Value, pool: Patch) -> Self {
        let mut log = Self::new(initial);
        log.pool = pool;
        log
    }

    /// Verifies that `versions` is `[0, 1, …, N]`. Never mutates or sorts.
    pub fn is_continuous(&self) -> bool {
        !self.versions.is_empty() && self.versions.iter().enumerate().all(|(i, v)| *v == i as u64)
    }

    /// The latest committed version number (`N`).
    pub fn latest_version(&self) -> u64 {
        *self.versions.last().expect("versions always contains at least 0")
    }

    // ──────────────────────────────────────────────────────────────────
    // Ingest path
    // ──────────────────────────────────────────────────────────────────

    /// Appends `ops` to the pool, FIFO. No version change, no validation
    /// beyond what the ops already carry.
    pub fn store(&mut self, ops: Patch) {
        self.pool.extend(ops);
    }

    /// Promotes the pool to a new version.
    ///
    /// An empty pool is a no-op (does not create a version). Otherwise, the
    /// pool is dry-run applied against the current snapshot first; only on
    /// success is it committed as `patches[N+1]` and `N+1` appended to
    /// `versions`. Failure at any step leaves the engine unchanged.
    pub fn append(&mut self) -> Result<(), LogumentError> {
        if self.pool.is_empty() {
            return Ok(());
        }
        let n = self.latest_version();
        let current = self.snapshot(n)?;
        tson_patch::apply(&current, &self.pool)?;
        let v = n + 1;
        self.patches.insert(v, std::mem::take(&mut self.pool));
        self.versions.push(v);
        Ok(())
    }

    /// A single-operation write: stages `op` (stamping `now` if its
    /// timestamp is unspecified) and immediately appends.
    pub fn set(&mut self, op: Operation) -> Result<(), LogumentError> {
        self.store(vec![stamp_if_unspecified(op)]);
        self.append()
    }

    /// A value-conditional write: if `op`'s value already matches the
    /// current value at `op`'s path in `snapshot_at(v)`, drops the
    /// operation with no patch emitted and no version created. Otherwise
    /// routes through [`Logument::set`].
    ///
    /// This is the filter that lets a firehose of per-cycle sensor writes
    /// collapse into patches only on genuine value change.
    pub fn test_set(&mut self, v: u64, op: Operation) -> Result<(), LogumentError> {
        let current = self.snapshot(v)?;
        let already_equal = match (
            tson::path::get_value(&current, op.path()),
            operation_value(&op),
        ) {
            (Ok(cur), Some(new_value)) => cur.equal_without_timestamps(new_value),
            _ => false,
        };
        if already_equal {
            return Ok(());
        }
        self.set(op)
    }

    // ──────────────────────────────────────────────────────────────────
    // Reconstruction
    // ──────────────────────────────────────────────────────────────────

    /// Reconstructs the document at version `v`, memoizing the result.
    ///
    /// Locates the nearest memoized version `prev ≤ v` (always succeeds,
    /// since `0` is always present), then folds `patches[prev+1..=v]` over
    /// `snapshots[prev]` via [`tson_patch::apply`].
    pub fn snapshot(&mut self, v: u64) -> Result<Value, LogumentError> {
        let n = self.latest_version();
        if v > n {
            return Err(LogumentError::RangeError(format!(
                "version {v} exceeds latest version {n}"
            )));
        }
        let prev = *self
            .snapshots
            .range(..=v)
            .next_back()
            .map(|(k, _)| k)
            .expect("snapshots always contains key 0");
        if prev == v {
            return Ok(self.snapshots[&prev].clone());
        }
        let mut working = self.snapshots[&prev].clone();
        for pv in (prev + 1)..=v {
            let patch = self.patches.get(&pv).ok_or_else(|| {
                LogumentError::InvariantViolation(format!("missing patches[{pv}]"))
            })?;
            working = tson_patch::apply(&working, patch)?;
        }
        self.snapshots.insert(v, working.clone());
        Ok(working)
    }

    /// Reconstructs the document as of timestamp `ts`: the latest version
    /// whose own latest leaf timestamp is `≤ ts`, plus any operations from
    /// later versions (and the pool) whose own timestamp is `≤ ts`.
    ///
    /// Purely observational: reads `pool` read-only and never appends a
    /// version, unlike the implementation this is modeled on (which could
    /// implicitly trigger an append when the target timestamp ran past the
    /// latest version).
    pub fn temporal_snapshot(&mut self, ts: i64) -> Result<Value, LogumentError> {
        let v_star = self.version_floor_for_timestamp(ts)?;
        let mut working = self.snapshot(v_star)?;
        let n = self.latest_version();
        for v in (v_star + 1)..=n {
            if let Some(patch) = self.patches.get(&v).cloned() {
                let filtered: Patch = patch
                    .into_iter()
                    .filter(|op| op.timestamp().map_or(true, |t| t <= ts))
                    .collect();
                if !filtered.is_empty() {
                    working = tson_patch::apply(&working, &filtered)?;
                }
            }
        }
        let filtered_pool: Patch = self
            .pool
            .iter()
            .filter(|op| op.timestamp().map_or(true, |t| t <= ts))
            .cloned()
            .collect();
        if !filtered_pool.is_empty() {
            working = tson_patch::apply(&working, &filtered_pool)?;
        }
        Ok(working)
    }

    /// The latest version whose reconstructed document has a max leaf
    /// timestamp `≤ ts`, falling back to `0` if none qualifies (`0` is
    /// always a valid floor, mirroring how `Snapshot` always has `0` to
    /// fall back on).
    fn version_floor_for_timestamp(&mut self, ts: i64) -> Result<u64, LogumentError> {
        let mut best = 0u64;
        for v in self.versions.clone() {
            let snap = self.snapshot(v)?;
            if snap.latest_timestamp() <= ts {
                best = v;
            }
        }
        Ok(best)
    }

    // ──────────────────────────────────────────────────────────────────
    // Versioned and temporal sub-extraction
    // ──────────────────────────────────────────────────────────────────

    /// Produces an independent engine covering versions `[vi, vj]`,
    /// preserving the original version numbering (not renumbered from
    /// `vi`), for traceability back to the parent engine.
    pub fn slice(&mut self, vi: u64, vj: u64) -> Result<Logument, LogumentError> {
        if vi > vj {
            return Err(LogumentError::RangeError(format!(
                "slice start {vi} exceeds end {vj}"
            )));
        }
        let n = self.latest_version();
        if vj > n {
            return Err(LogumentError::RangeError(format!(
                "slice end {vj} exceeds latest version {n}"
            )));
        }
        let base = self.snapshot(vi)?;
        let mut snapshots = BTreeMap::new();
        snapshots.insert(vi, base);
        for (&v, snap) in self.snapshots.range((vi + 1)..=vj) {
            snapshots.insert(v, snap.clone());
        }
        let mut versions = vec![vi];
        let mut patches = BTreeMap::new();
        for v in (vi + 1)..=vj {
            if let Some(patch) = self.patches.get(&v) {
                patches.insert(v, patch.clone());
                versions.push(v);
            }
        }
        Ok(Logument {
            versions,
            snapshots,
            patches,
            pool: Vec::new(),
            metadata: self.metadata.clone(),
        })
    }

    /// Like [`Logument::slice`], but scoped by timestamp range instead of
    /// version range: the base is synthesized via
    /// [`Logument::temporal_snapshot`] at `tsi`, and each retained
    /// version's patch is filtered to operations whose timestamp falls in
    /// `[tsi, tsj]`. A version with no surviving operations is omitted.
    pub fn temporal_slice(&mut self, tsi: i64, tsj: i64) -> Result<Logument, LogumentError> {
        if tsi > tsj {
            return Err(LogumentError::RangeError(format!(
                "temporal slice start {tsi} exceeds end {tsj}"
            )));
        }
        let v_lo = self.version_floor_for_timestamp(tsi)?;
        let v_hi = self.version_floor_for_timestamp(tsj)?.max(v_lo);
        let base = self.temporal_snapshot(tsi)?;
        let mut snapshots = BTreeMap::new();
        snapshots.insert(v_lo, base);
        let mut versions = vec![v_lo];
        let mut patches = BTreeMap::new();
        for v in (v_lo + 1)..=v_hi {
            if let Some(patch) = self.patches.get(&v) {
                let filtered: Patch = patch
                    .iter()
                    .filter(|op| op.timestamp().map_or(false, |t| t >= tsi && t <= tsj))
                    .cloned()
                    .collect();
                if !filtered.is_empty() {
                    patches.insert(v, filtered);
                    versions.push(v);
                }
            }
        }
        Ok(Logument {
            versions,
            snapshots,
            patches,
            pool: Vec::new(),
            metadata: self.metadata.clone(),
        })
    }
}

pub(crate) fn operation_value(op: &Operation) -> Option<&Value> {
    match op {
        Operation::Add { value, .. }
        | Operation::Replace { value, .. }
        | Operation::Test { value, .. } => Some(value),
        _ => None,
    }
}

fn stamp_if_unspecified(op: Operation) -> Operation {
    if op.timestamp() != Some(UNSPECIFIED_TIMESTAMP) {
        return op;
    }
    let ts = now_ts();
    match op {
        Operation::Add { path, value, .. } => Operation::Add {
            path,
            value,
            timestamp: ts,
        },
        Operation::Replace { path, value, .. } => Operation::Replace {
            path,
            value,
            timestamp: ts,
        },
        Operation::Remove { path, .. } => Operation::Remove { path, timestamp: ts },
        Operation::Move { path, from, .. } => Operation::Move {
            path,
            from,
            timestamp: ts,
        },
        Operation::Copy { path, from, .. } => Operation::Copy {
            path,
            from,
            timestamp: ts,
        },
        Operation::Test { .. } => op,
    }
}

fn now_ts() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logument_pointer::parse_pointer;

    fn initial_doc() -> Value {
        Value::object([
            ("speed".to_string(), Value::number(72.5, 1_700_000_000)),
            ("engineOn".to_string(), Value::bool(true, 1_700_000_000)),
        ])
    }

    // ── Scenario 1: seeded round ───────────────────────────────────────

    #[test]
    fn seeded_round_store_then_append_creates_version_one() {
        let mut log = Logument::new(initial_doc());
        log.store(vec![Operation::Replace {
            path: parse_pointer("/speed"),
            value: Value::number(80.0, 1_700_000_100),
            timestamp: 1_700_000_100,
        }]);
        log.append().unwrap();

        assert_eq!(log.versions, vec![0, 1]);
        assert_eq!(
            tson::path::get_value(&log.snapshot(1).unwrap(), &parse_pointer("/speed")).unwrap(),
            &Value::number(80.0, 1_700_000_100)
        );
        assert_eq!(
            tson::path::get_value(&log.snapshot(0).unwrap(), &parse_pointer("/speed")).unwrap(),
            &Value::number(72.5, 1_700_000_000)
        );
    }

    #[test]
    fn append_with_empty_pool_is_a_no_op() {
        let mut log = Logument::new(initial_doc());
        log.append().unwrap();
        assert_eq!(log.versions, vec![0]);
    }

    #[test]
    fn append_failure_leaves_engine_unchanged() {
        let mut log = Logument::new(initial_doc());
        log.store(vec![Operation::Remove {
            path: parse_pointer("/missing"),
            timestamp: 10,
        }]);
        assert!(log.append().is_err());
        assert_eq!(log.versions, vec![0]);
        assert!(!log.pool.is_empty());
    }

    // ── Scenario 2: TestSet drops a no-op ──────────────────────────────

    #[test]
    fn test_set_drops_when_value_already_matches() {
        let mut log = Logument::new(Value::object([(
            "engineOn".to_string(),
            Value::bool(true, 10),
        )]));
        log.test_set(
            0,
            Operation::Replace {
                path: parse_pointer("/engineOn"),
                value: Value::bool(true, 20),
                timestamp: 20,
            },
        )
        .unwrap();
        assert_eq!(log.versions, vec![0]);
        assert!(log.patches.is_empty());
    }

    #[test]
    fn test_set_commits_on_genuine_change() {
        let mut log = Logument::new(Value::object([(
            "engineOn".to_string(),
            Value::bool(true, 10),
        )]));
        log.test_set(
            0,
            Operation::Replace {
                path: parse_pointer("/engineOn"),
                value: Value::bool(false, 20),
                timestamp: 20,
            },
        )
        .unwrap();
        assert_eq!(log.versions, vec![0, 1]);
    }

    #[test]
    fn test_set_idempotence_two_identical_calls_create_one_version() {
        let mut log = Logument::new(Value::object([(
            "engineOn".to_string(),
            Value::bool(true, 10),
        )]));
        let op = || Operation::Replace {
            path: parse_pointer("/engineOn"),
            value: Value::bool(false, 20),
            timestamp: 20,
        };
        log.test_set(0, op()).unwrap();
        log.test_set(1, op()).unwrap();
        assert_eq!(log.versions, vec![0, 1]);
    }

    // ── Scenario 4: TemporalSnapshot intra-version ─────────────────────

    #[test]
    fn temporal_snapshot_includes_pool_ops_up_to_timestamp() {
        let mut log = Logument::new(Value::object([
            ("x".to_string(), Value::number(1.0, 0)),
            ("y".to_string(), Value::number(1.0, 0)),
            ("z".to_string(), Value::number(1.0, 0)),
        ]));
        log.store(vec![
            Operation::Replace {
                path: parse_pointer("/x"),
                value: Value::number(10.0, 100),
                timestamp: 100,
            },
            Operation::Replace {
                path: parse_pointer("/y"),
                value: Value::number(20.0, 200),
                timestamp: 200,
            },
            Operation::Replace {
                path: parse_pointer("/z"),
                value: Value::number(30.0, 300),
                timestamp: 300,
            },
        ]);
        log.append().unwrap();
        log.store(vec![Operation::Replace {
            path: parse_pointer("/x"),
            value: Value::number(42.0, 250),
            timestamp: 250,
        }]);

        let snap = log.temporal_snapshot(250).unwrap();
        assert_eq!(
            tson::path::get_value(&snap, &parse_pointer("/x")).unwrap(),
            &Value::number(42.0, 250)
        );
        assert_eq!(
            tson::path::get_value(&snap, &parse_pointer("/y")).unwrap(),
            &Value::number(20.0, 200)
        );
        assert_eq!(
            tson::path::get_value(&snap, &parse_pointer("/z")).unwrap(),
            &Value::number(1.0, 0)
        );
        // Purely observational: no version was created.
        assert_eq!(log.versions, vec![0, 1]);
        assert!(!log.pool.is_empty());
    }

    // ── Slice / TemporalSlice ──────────────────────────────────────────

    #[test]
    fn slice_preserves_original_version_numbers() {
        let mut log = Logument::new(initial_doc());
        for ts in [100, 200, 300] {
            log.store(vec![Operation::Replace {
                path: parse_pointer("/speed"),
                value: Value::number(ts as f64, ts),
                timestamp: ts,
            }]);
            log.append().unwrap();
        }
        let mut slice = log.slice(1, 2).unwrap();
        assert_eq!(slice.versions, vec![1, 2]);
        assert_eq!(
            tson::path::get_value(&slice.snapshot(2).unwrap(), &parse_pointer("/speed")).unwrap(),
            &Value::number(200.0, 200)
        );
    }

    #[test]
    fn slice_rejects_out_of_range_end() {
        let mut log = Logument::new(initial_doc());
        assert!(matches!(
            log.slice(0, 5),
            Err(LogumentError::RangeError(_))
        ));
    }

    #[test]
    fn is_continuous_holds_after_normal_growth() {
        let mut log = Logument::new(initial_doc());
        log.store(vec![Operation::Replace {
            path: parse_pointer("/speed"),
            value: Value::number(1.0, 1),
            timestamp: 1,
        }]);
        log.append().unwrap();
        assert!(log.is_continuous());
    }
}
