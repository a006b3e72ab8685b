//! Error taxonomy for the Logument engine.

use thiserror::Error;

/// An error surfaced by a [`crate::Logument`] operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LogumentError {
    #[error(transparent)]
    Patch(#[from] tson_patch::PatchError),

    #[error(transparent)]
    Parse(#[from] tson::ParseError),

    #[error("value out of range: {0}")]
    RangeError(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("operation {0} is not implemented")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Serialization(#[from] tson::SerializationError),
}
