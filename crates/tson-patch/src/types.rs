//! Core types for TSON-Patch: the `Operation` enum, `Patch`
//! alias, and error taxonomy.
//!
//! Mirrors the shape of `json-joy::json_patch::types::Op`, trimmed to the
//! operation set required for core correctness: `Add`, `Remove`, `Replace`, `Move`,
//! `Copy`, `Test`.

use thiserror::Error;
use tson::PathError;

pub use logument_pointer::Path;
use tson::Value;

/// An error while applying a [`Operation`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("path {path:?}: expected {expected}, found {found}")]
    TypeError {
        path: Vec<String>,
        expected: &'static str,
        found: &'static str,
    },
    #[error("test failed at {path:?}: value does not match")]
    TestFailed { path: Vec<String> },
    #[error("move target {to:?} is a descendant of source {from:?}")]
    MoveIntoDescendant { from: Vec<String>, to: Vec<String> },
    #[error("operation {0} is not implemented")]
    NotImplemented(&'static str),
}

/// A single TSON-Patch operation.
///
/// Every operation's `timestamp` is the logical write time of the edit.
/// When the operation carries a single leaf `value`, this is conventionally
/// that leaf's own timestamp; for container values and for `Remove`, it is
/// the timestamp the engine should attribute the edit to (used by
/// `logument`'s `History`/`Track` ordering).
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Add {
        path: Path,
        value: Value,
        timestamp: i64,
    },
    Remove {
        path: Path,
        timestamp: i64,
    },
    Replace {
        path: Path,
        value: Value,
        timestamp: i64,
    },
    Move {
        path: Path,
        from: Path,
        timestamp: i64,
    },
    Copy {
        path: Path,
        from: Path,
        timestamp: i64,
    },
    Test {
        path: Path,
        value: Value,
    },
}

/// An ordered sequence of operations, applied left to right.
pub type Patch = Vec<Operation>;

impl Operation {
    pub fn op_name(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "add",
            Operation::Remove { .. } => "remove",
            Operation::Replace { .. } => "replace",
            Operation::Move { .. } => "move",
            Operation::Copy { .. } => "copy",
            Operation::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Operation::Add { path, .. } => path,
            Operation::Remove { path, .. } => path,
            Operation::Replace { path, .. } => path,
            Operation::Move { path, .. } => path,
            Operation::Copy { path, .. } => path,
            Operation::Test { path, .. } => path,
        }
    }

    /// The operation's logical timestamp, where applicable. `Test` carries
    /// none, since it never mutates the document.
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Operation::Add { timestamp, .. }
            | Operation::Remove { timestamp, .. }
            | Operation::Replace { timestamp, .. }
            | Operation::Move { timestamp, .. }
            | Operation::Copy { timestamp, .. } => Some(*timestamp),
            Operation::Test { .. } => None,
        }
    }
}
