//! Logument: a versioned, temporal document store over TSON and
//! TSON-Patch.
//!
//! [`Logument`] holds a seeded baseline, a `BTreeMap` of per-version
//! patches, and a pool of staged-but-uncommitted operations; it can
//! reconstruct the document at any version ([`Logument::snapshot`]) or any
//! timestamp ([`Logument::temporal_snapshot`]), extract sub-ranges
//! ([`Logument::slice`], [`Logument::temporal_slice`]), and compact
//! repeated writes at a path down to its genuine history
//! ([`Logument::compact`], [`Logument::history`]). [`wire`] reads and
//! writes its JSON persistence form.

pub mod engine;
pub mod error;
pub mod track;
pub mod wire;

pub use engine::Logument;
pub use error::LogumentError;
pub use wire::{emit_wire, emit_wire_pretty, from_wire_json, parse_wire, to_wire_json};
