use crate::errors::ApiError;
use attic_storage::naming::validate_reference;

/// Turns the captured route path into a validated reference
pub fn parse_reference(requested_path: &str) -> Result<&str, ApiError> {
    let reference = requested_path.trim_start_matches('/');

    if reference.is_empty() {
        tracing::warn!("serve_file: requested_path is empty");
        return Err(ApiError::NotFound);
    }

    // Rejects traversal, absolute paths, drive letters and null bytes
    validate_reference(reference)?;

    Ok(reference)
}

/// Display name of a stored object: the final segment without its token
pub fn display_name(reference: &str) -> &str {
    let name = reference.rsplit('/').next().unwrap_or(reference);
    match name.split_once('_') {
        Some((token, rest)) if token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit()) => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference("tasks/42/abc_report.pdf").unwrap(), "tasks/42/abc_report.pdf");
        assert_eq!(parse_reference("/tasks/42/x").unwrap(), "tasks/42/x");

        assert!(matches!(parse_reference(""), Err(ApiError::NotFound)));
        assert!(matches!(parse_reference("tasks/../../etc/passwd"), Err(ApiError::Storage(_))));
        assert!(matches!(parse_reference("C:\\boot.ini"), Err(ApiError::Storage(_))));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name("tasks/42/0123456789abcdef0123456789abcdef_report.pdf"),
            "report.pdf"
        );
        assert_eq!(display_name("tasks/42/my_file.txt"), "my_file.txt");
        assert_eq!(display_name("plain.txt"), "plain.txt");
    }
}
