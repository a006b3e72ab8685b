//! TSON-Patch: an RFC 6902-style patch format over TSON documents.
//!
//! [`apply`] applies a [`Patch`] to a document; [`diff`] (and
//! [`diff_with_timestamps`]) compute one from two documents. Both build on
//! `tson::path`'s navigation primitives. [`codec`] reads and writes the
//! JSON-array wire form.

pub mod apply;
pub mod codec;
pub mod diff;
pub mod types;

pub use apply::{apply, apply_one};
pub use codec::{emit_patch, emit_patch_pretty, parse_patch};
pub use diff::{diff, diff_with_timestamps};
pub use types::{Operation, Patch, PatchError};
