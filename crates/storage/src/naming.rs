//! Reference naming policy shared by every backend.
//!
//! A reference is `{folder}/{token}_{filename}` where `token` is 128 random
//! bits in hex. The token makes references collision free and unguessable
//! from the filename alone, and it is never reused after a delete.

use crate::StorageError;
use uuid::Uuid;

/// Mints a fresh 128-bit token as 32 lowercase hex characters
pub fn unique_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalizes a caller-supplied folder to forward-slash segments.
///
/// Empty and `.` segments are dropped; anything that could climb out of the
/// namespace is rejected.
pub fn normalize_folder(folder: &str) -> Result<String, StorageError> {
    check_common(folder)?;

    let mut segments = Vec::new();
    for segment in folder.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::invalid(format!(
                    "Folder '{}' contains '..' (path traversal attempt)",
                    folder
                )))
            }
            _ => segments.push(segment),
        }
    }

    Ok(segments.join("/"))
}

/// Reduces a display filename to a safe final path component.
///
/// Only the last real segment is kept, so `../../etc/passwd` becomes `passwd`.
/// Characters outside `[A-Za-z0-9._-]` are replaced with `_`.
pub fn sanitize_filename(filename: &str) -> Result<String, StorageError> {
    if filename.contains('\0') {
        return Err(StorageError::invalid("Filename contains null byte"));
    }

    let last = filename
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .last()
        .ok_or_else(|| StorageError::invalid(format!("Filename '{}' has no usable name", filename)))?;

    let sanitized: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    Ok(sanitized)
}

/// Composes a new, never before issued reference for `filename` under `folder`
pub fn compose_reference(folder: &str, filename: &str) -> Result<String, StorageError> {
    let folder = normalize_folder(folder)?;
    let filename = sanitize_filename(filename)?;
    let token = unique_token();

    if folder.is_empty() {
        Ok(format!("{}_{}", token, filename))
    } else {
        Ok(format!("{}/{}_{}", folder, token, filename))
    }
}

/// Validates a reference before it is turned into a path, key or URL
pub fn validate_reference(reference: &str) -> Result<(), StorageError> {
    if reference.is_empty() {
        return Err(StorageError::invalid("Reference is empty"));
    }

    check_common(reference)?;

    if reference.starts_with('/') || reference.starts_with('\\') {
        return Err(StorageError::invalid("Absolute paths are not allowed"));
    }

    if reference.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(StorageError::invalid(
            "Reference contains '..' (path traversal attempt)",
        ));
    }

    Ok(())
}

fn check_common(value: &str) -> Result<(), StorageError> {
    if value.contains('\0') {
        return Err(StorageError::invalid("Path contains null byte"));
    }

    // Windows drive letters (C:, D:, etc.)
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(StorageError::invalid("Drive letters are not allowed"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_token(value: &str) -> bool {
        value.len() == 32 && value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    #[test]
    fn test_unique_token_format() {
        let a = unique_token();
        let b = unique_token();
        assert!(is_token(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("tasks/42").unwrap(), "tasks/42");
        assert_eq!(normalize_folder("/tasks//42/").unwrap(), "tasks/42");
        assert_eq!(normalize_folder("tasks\\42").unwrap(), "tasks/42");
        assert_eq!(normalize_folder("./tasks/./42").unwrap(), "tasks/42");
        assert_eq!(normalize_folder("").unwrap(), "");

        assert!(normalize_folder("tasks/../../etc").is_err());
        assert!(normalize_folder("C:/windows").is_err());
        assert!(normalize_folder("tasks/\0").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf").unwrap(), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini").unwrap(), "boot.ini");
        assert_eq!(sanitize_filename("notes/..").unwrap(), "notes");
        assert_eq!(sanitize_filename("日本語.pdf").unwrap(), "___.pdf");

        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("../..").is_err());
        assert!(sanitize_filename("a\0b").is_err());
    }

    #[test]
    fn test_compose_reference() {
        let reference = compose_reference("tasks/42", "report.pdf").unwrap();
        let (folder, name) = reference.rsplit_once('/').unwrap();
        let (token, filename) = name.split_once('_').unwrap();

        assert_eq!(folder, "tasks/42");
        assert!(is_token(token));
        assert_eq!(filename, "report.pdf");
    }

    #[test]
    fn test_compose_reference_without_folder() {
        let reference = compose_reference("", "a.txt").unwrap();
        assert!(!reference.contains('/'));
        assert!(reference.ends_with("_a.txt"));
    }

    #[test]
    fn test_compose_reference_never_repeats() {
        let a = compose_reference("tasks/1", "same.txt").unwrap();
        let b = compose_reference("tasks/1", "same.txt").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_traversal_filename_stays_in_folder() {
        let reference = compose_reference("tasks/7", "../../etc/passwd").unwrap();
        assert!(reference.starts_with("tasks/7/"));
        assert!(validate_reference(&reference).is_ok());
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference("tasks/42/abc_report.pdf").is_ok());
        assert!(validate_reference("tasks/42/abc_report..pdf").is_ok());

        assert!(validate_reference("").is_err());
        assert!(validate_reference("/etc/passwd").is_err());
        assert!(validate_reference("tasks/../../etc/passwd").is_err());
        assert!(validate_reference("tasks\\..\\secret").is_err());
        assert!(validate_reference("C:\\Windows").is_err());
        assert!(validate_reference("tasks/\0").is_err());
    }
}
