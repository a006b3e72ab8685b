//! JSON Pointer (RFC 6901) string/path utilities.
//!
//! This crate is value-agnostic: it converts between JSON Pointer strings
//! and path segment vectors, and validates them, but does not know how to
//! navigate any particular tree type. Tree-specific navigation (TSON's
//! `GetValue`) lives next to the tree type in the `tson` crate.
//!
//! # Example
//!
//! ```
//! use logument_pointer::{parse_pointer, format_pointer};
//!
//! let path = parse_pointer("/speed/unit");
//! assert_eq!(path, vec!["speed".to_string(), "unit".to_string()]);
//! assert_eq!(format_pointer(&path), "/speed/unit");
//! ```

pub mod validate;
pub use validate::{validate_path, validate_pointer, ValidationError};

/// A single step in a JSON Pointer path: an object key or an array index
/// (as decimal text) or `-` (array append marker).
pub type PathStep = String;

/// A parsed JSON Pointer: a sequence of unescaped path steps. The empty
/// path refers to the document root.
pub type Path = Vec<PathStep>;

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
/// Order matters: `~1` must be resolved before `~0`.
///
/// # Example
///
/// ```
/// use logument_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `~` is replaced with `~0` and `/` is replaced with `~1`.
/// Order matters: `~` must be escaped before `/`.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parses a JSON Pointer string into path segments.
///
/// The empty string parses to the empty path (the root). A non-empty
/// pointer must start with `/`; everything after the leading `/` is
/// split on `/` and each segment unescaped.
///
/// # Example
///
/// ```
/// use logument_pointer::parse_pointer;
///
/// assert_eq!(parse_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_pointer("/"), vec![""]);
/// assert_eq!(parse_pointer("/foo/bar"), vec!["foo", "bar"]);
/// assert_eq!(parse_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_pointer(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..].split('/').map(unescape_component).collect()
}

/// Formats path segments into a JSON Pointer string.
///
/// Returns the empty string for the root path.
///
/// # Example
///
/// ```
/// use logument_pointer::format_pointer;
///
/// assert_eq!(format_pointer(&[]), "");
/// assert_eq!(format_pointer(&["foo".to_string()]), "/foo");
/// ```
pub fn format_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Returns `true` if `path` refers to the document root.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty()
}

/// Returns `true` if `parent` is a strict prefix of `child`.
///
/// # Example
///
/// ```
/// use logument_pointer::is_child;
///
/// let parent = vec!["a".to_string()];
/// let child = vec!["a".to_string(), "b".to_string()];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// assert!(!is_child(&parent, &parent));
/// ```
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    if parent.len() >= child.len() {
        return false;
    }
    parent.iter().zip(child.iter()).all(|(a, b)| a == b)
}

/// Returns `true` if two paths have identical segments.
pub fn is_path_equal(a: &[String], b: &[String]) -> bool {
    a == b
}

/// Splits `path` into its parent path and final segment.
///
/// Returns `None` for the root path, which has no parent.
///
/// # Example
///
/// ```
/// use logument_pointer::split_last;
///
/// assert_eq!(split_last(&["a".to_string(), "b".to_string()]),
///            Some((vec!["a".to_string()], "b".to_string())));
/// assert_eq!(split_last(&[]), None);
/// ```
pub fn split_last(path: &[String]) -> Option<(Path, PathStep)> {
    let (last, parent) = path.split_last()?;
    Some((parent.to_vec(), last.clone()))
}
