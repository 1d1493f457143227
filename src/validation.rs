//! Validation of document IDs before they are used to build storage paths.
//!
//! Job IDs, process IDs and process versions all end up as file names in the
//! file-backed store, so they are checked here to prevent path traversal.

use crate::error::{Error, Result};

/// Maximum allowed length for document IDs.
pub const MAX_ID_LENGTH: usize = 256;

/// Reserved names that cannot be used as IDs (case-insensitive).
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Validates that a document ID is safe for use in file paths.
///
/// An ID is valid if:
/// - It is not empty
/// - It is no longer than MAX_ID_LENGTH characters
/// - It contains only alphanumeric characters, `-`, `_`, `.` and `:`
/// - It does not start with a dot or contain `..`
/// - It does not use reserved system names
///
/// # Arguments
///
/// * `field` - Name of the field being validated, reported on failure
/// * `id` - The ID string to validate
///
/// # Examples
///
/// ```
/// use heddle::validation::validate_id;
///
/// assert!(validate_id("jobID", "987688b0-5237-2023-06-13T17:01:02.321072").is_ok());
/// assert!(validate_id("jobID", "").is_err());
/// assert!(validate_id("jobID", "../etc/passwd").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> Result<()> {
    let invalid = |message: String| Error::Validation {
        subject: "document id",
        field: field.to_string(),
        message,
    };

    if id.is_empty() {
        return Err(invalid("ID cannot be empty".to_string()));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(invalid(format!(
            "ID too long: {} characters (max {MAX_ID_LENGTH})",
            id.len()
        )));
    }

    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !valid_chars {
        return Err(invalid(format!(
            "ID '{id}' contains invalid characters. Use only alphanumeric characters, '-', '_', '.' and ':'"
        )));
    }

    if id.starts_with('.') || id.contains("..") {
        return Err(invalid(format!("ID '{id}' contains a relative path segment")));
    }

    let id_lower = id.to_lowercase();
    if RESERVED_NAMES.contains(&id_lower.as_str()) {
        return Err(invalid(format!("ID '{id}' uses a reserved name")));
    }

    Ok(())
}

/// Clap value parser for validating job ID arguments.
pub fn clap_job_id_validator(s: &str) -> std::result::Result<String, String> {
    validate_id("jobID", s).map_err(|e| e.to_string())?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id_valid() {
        assert!(validate_id("jobID", "job-001").is_ok());
        assert!(validate_id("processVersion", "1.0.2").is_ok());
        assert!(validate_id("jobID", "a").is_ok());
        assert!(validate_id(
            "jobID",
            "987688b0-5237-43d4-b2ac-c22560df395b-2023-06-13T17:01:02.321072"
        )
        .is_ok());
    }

    #[test]
    fn test_validate_id_empty() {
        let result = validate_id("jobID", "");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_id_too_long() {
        let long_id = "a".repeat(MAX_ID_LENGTH + 1);
        let result = validate_id("jobID", &long_id);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too long"));
    }

    #[test]
    fn test_validate_id_path_traversal() {
        assert!(validate_id("jobID", "job/001").is_err());
        assert!(validate_id("jobID", "../passwd").is_err());
        assert!(validate_id("jobID", "job..001").is_err());
        assert!(validate_id("jobID", ".hidden").is_err());
        assert!(validate_id("jobID", "job 001").is_err());
    }

    #[test]
    fn test_validate_id_reserved_names() {
        assert!(validate_id("processID", "CON").is_err());
        assert!(validate_id("processID", "nul").is_err());
    }

    #[test]
    fn test_validate_id_reports_field() {
        let err = validate_id("processVersion", "a/b").unwrap_err();
        assert!(err.to_string().contains("`processVersion`"));
    }

    #[test]
    fn test_clap_validator() {
        assert!(clap_job_id_validator("valid-id").is_ok());
        assert!(clap_job_id_validator("../invalid").is_err());
    }
}
