use std::path::Path;

use crate::errors::{ErrorCategory, ParserError};
use crate::models::ResumeRecord;

pub const ALL_FIELDS_OK: &str = "All fields extracted successfully";

/// Builds the human-readable `reasons_explanations` text for one attempt.
/// Multiple reasons are joined with `"; "`.
pub fn explain(record: Option<&ResumeRecord>, error: Option<&ParserError>, filename: &str) -> String {
    let mut reasons = Vec::new();

    match (error, record) {
        (Some(error), _) => reasons.push(explain_error(error, filename)),
        (None, Some(record)) => {
            if !record.has_name() {
                reasons.push("Name extraction: failed or empty".to_string());
            }
            if !record.has_email() {
                reasons.push("Email extraction: failed or empty".to_string());
            }
            if !record.has_skills() {
                reasons.push("Skills extraction: failed or empty".to_string());
            }
            reasons.extend(edge_case_note(filename).map(str::to_string));
        }
        (None, None) => reasons.push("No result produced".to_string()),
    }

    if reasons.is_empty() {
        ALL_FIELDS_OK.to_string()
    } else {
        reasons.join("; ")
    }
}

fn explain_error(error: &ParserError, filename: &str) -> String {
    match error.category() {
        ErrorCategory::Parsing => {
            if matches!(error, ParserError::NotFound(_)) {
                return "File not found".to_string();
            }
            let message = error.to_string().to_lowercase();
            let file_type = file_type(filename);
            if message.contains("encrypted") || message.contains("password") {
                format!("Edge case: Encrypted {file_type}, requires password")
            } else if message.contains("corrupted") || message.contains("no text content") {
                format!("Edge case: Corrupted or image-based {file_type}")
            } else if message.contains("not found") {
                "File not found".to_string()
            } else {
                format!("File parsing error: {error}")
            }
        }
        ErrorCategory::Extraction => format!("Extraction error: {error}"),
        ErrorCategory::Api => format!("API error: model backend call failed ({error})"),
        ErrorCategory::Validation => format!("Validation error: {error}"),
        ErrorCategory::Other => format!("Unexpected error: {}: {error}", error.kind()),
    }
}

fn file_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("pdf") => "PDF file",
        Some("docx") => "DOCX file",
        _ => "file",
    }
}

/// Notes for the fixture files kept under an `edge_cases` directory.
fn edge_case_note(filename: &str) -> Option<&'static str> {
    if !filename.contains("edge_cases") {
        return None;
    }
    let lower = filename.to_lowercase();
    if lower.contains("minimal") {
        Some("Edge case: Minimal content resume")
    } else if lower.contains("encrypted") {
        Some("Edge case: Encrypted PDF")
    } else if lower.contains("corrupted") {
        Some("Edge case: Corrupted PDF")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn full() -> ResumeRecord {
        ResumeRecord::new("Jane Doe", "jane@acme.io", vec!["Rust".to_string()])
    }

    #[test]
    fn test_all_fields_present() {
        assert_eq!(explain(Some(&full()), None, "jane.pdf"), ALL_FIELDS_OK);
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let record = ResumeRecord::new("", "jane@acme.io", vec![]);
        assert_eq!(
            explain(Some(&record), None, "jane.pdf"),
            "Name extraction: failed or empty; Skills extraction: failed or empty"
        );
    }

    #[test]
    fn test_encrypted_pdf() {
        let err = ParserError::FileUnreadable(
            "Cannot decrypt PDF: cv.pdf. The file is encrypted and requires a password.".into(),
        );
        assert_eq!(
            explain(None, Some(&err), "cv.pdf"),
            "Edge case: Encrypted PDF file, requires password"
        );
    }

    #[test]
    fn test_corrupted_docx() {
        let err = ParserError::FileUnreadable(
            "No text content extracted from Word document: cv.docx".into(),
        );
        assert_eq!(
            explain(None, Some(&err), "cv.DOCX"),
            "Edge case: Corrupted or image-based DOCX file"
        );
    }

    #[test]
    fn test_not_found_wins_over_filename_words() {
        let err = ParserError::NotFound(PathBuf::from("edge_cases/encrypted.pdf"));
        assert_eq!(
            explain(None, Some(&err), "edge_cases/encrypted.pdf"),
            "File not found"
        );
    }

    #[test]
    fn test_generic_parse_error() {
        let err = ParserError::FileUnreadable("Path is not a file: resumes".into());
        assert_eq!(
            explain(None, Some(&err), "resumes"),
            "File parsing error: Path is not a file: resumes"
        );
    }

    #[test]
    fn test_category_templates() {
        let extraction = ParserError::EmptyInput;
        assert_eq!(
            explain(None, Some(&extraction), "a.pdf"),
            "Extraction error: Cannot extract from empty text"
        );

        let api = ParserError::TransientBackend("rate limit".into());
        assert!(explain(None, Some(&api), "a.pdf").starts_with("API error:"));

        let validation = ParserError::UnsupportedFormat {
            extension: ".txt".into(),
            supported: ".docx, .pdf".into(),
        };
        assert_eq!(
            explain(None, Some(&validation), "a.txt"),
            "Validation error: Unsupported file format: .txt. Supported formats: .docx, .pdf"
        );

        let other = ParserError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(
            explain(None, Some(&other), "a.pdf"),
            "Unexpected error: Io: IO error: disk full"
        );
    }

    #[test]
    fn test_error_ignores_record_fields() {
        let err = ParserError::Backend("401".into());
        let text = explain(Some(&full()), Some(&err), "a.pdf");
        assert!(!text.contains("extraction: failed"));
    }

    #[test]
    fn test_edge_case_notes() {
        let minimal = ResumeRecord::new("Jane Doe", "", vec![]);
        assert_eq!(
            explain(Some(&minimal), None, "edge_cases/minimal_resume.pdf"),
            "Email extraction: failed or empty; Skills extraction: failed or empty; \
             Edge case: Minimal content resume"
        );
        assert_eq!(
            explain(Some(&minimal), None, "minimal_resume.pdf"),
            "Email extraction: failed or empty; Skills extraction: failed or empty"
        );
    }
}
