//! Validation functions for JSON Pointer strings and parsed paths.

use thiserror::Error;

/// Maximum allowed pointer string length.
const MAX_POINTER_LENGTH: usize = 4096;

/// Maximum allowed path depth.
const MAX_PATH_LENGTH: usize = 512;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("POINTER_INVALID: must be empty or start with '/'")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("PATH_TOO_LONG")]
    PathTooLong,
}

/// Validates a raw JSON Pointer string before parsing it.
///
/// # Example
///
/// ```
/// use logument_pointer::validate_pointer;
///
/// validate_pointer("").unwrap();
/// validate_pointer("/speed").unwrap();
/// validate_pointer("speed").unwrap_err();
/// ```
pub fn validate_pointer(pointer: &str) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(ValidationError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(ValidationError::PointerTooLong);
    }
    Ok(())
}

/// Validates a parsed path's depth.
pub fn validate_path(path: &[String]) -> Result<(), ValidationError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_absolute_pointers_are_valid() {
        assert!(validate_pointer("").is_ok());
        assert!(validate_pointer("/").is_ok());
        assert!(validate_pointer("/a/b").is_ok());
    }

    #[test]
    fn relative_pointers_are_rejected() {
        assert!(validate_pointer("a/b").is_err());
    }

    #[test]
    fn overlong_pointer_is_rejected() {
        let long = "/".to_string() + &"a".repeat(MAX_POINTER_LENGTH + 1);
        assert!(validate_pointer(&long).is_err());
    }

    #[test]
    fn path_depth_limit_is_enforced() {
        let ok: Vec<String> = (0..MAX_PATH_LENGTH).map(|i| i.to_string()).collect();
        assert!(validate_path(&ok).is_ok());
        let too_deep: Vec<String> = (0..MAX_PATH_LENGTH + 1).map(|i| i.to_string()).collect();
        assert!(validate_path(&too_deep).is_err());
    }
}
