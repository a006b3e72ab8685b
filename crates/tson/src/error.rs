//! Error taxonomy for TSON parsing and path resolution.

use thiserror::Error;

/// A lexical, structural, or semantic error while parsing TSON or
/// Compatible-TSON text. Carries the byte offset of the failure.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("byte {offset}: {reason}")]
pub struct ParseError {
    pub offset: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// A path resolution failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("path {path:?}: key not found")]
    NotFound { path: Vec<String> },
    #[error("path {path:?}: index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        path: Vec<String>,
        index: usize,
        len: usize,
    },
    #[error("path {path:?}: segment {segment:?} is not a valid array index")]
    InvalidArrayIndex { path: Vec<String>, segment: String },
    #[error("path {path:?}: cannot navigate into a leaf")]
    IntoLeaf { path: Vec<String> },
    #[error("path {path:?}: intermediate arrays cannot be auto-created")]
    CannotCreateArray { path: Vec<String> },
}

/// An unrepresentable value was asked to be serialized, e.g. a non-finite
/// `f64`.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("value is not representable: {reason}")]
pub struct SerializationError {
    pub reason: String,
}
