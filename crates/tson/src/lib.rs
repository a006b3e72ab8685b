//! TSON: a timestamped JSON-superset data model.
//!
//! Every primitive leaf (`string`, `number`, `bool`) carries its own
//! timestamp; containers (`Object`, `Array`) carry none of their own and
//! report the maximum timestamp found anywhere in their subtree. This
//! crate provides the tree type ([`model`]), its grammar and parser
//! ([`parser`]), three codecs ([`codec`]), and JSON-Pointer-style
//! navigation and mutation ([`path`]) that `tson-patch` builds on.

pub mod codec;
pub mod error;
pub mod model;
pub mod parser;
pub mod path;

pub use error::{ParseError, PathError, SerializationError};
pub use model::{Leaf, LeafValue, Value, UNSPECIFIED_TIMESTAMP};
pub use parser::{parse, parse_with, ParserOptions};
