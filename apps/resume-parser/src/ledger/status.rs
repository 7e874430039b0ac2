use crate::errors::ParserError;
use crate::models::{ParseStatus, ResumeRecord};

/// Classifies an attempt. Any error, or a missing record, is `Failed`;
/// otherwise the number of populated fields decides.
pub fn classify_status(record: Option<&ResumeRecord>, error: Option<&ParserError>) -> ParseStatus {
    let record = match (record, error) {
        (Some(record), None) => record,
        _ => return ParseStatus::Failed,
    };

    let populated = [record.has_name(), record.has_email(), record.has_skills()]
        .into_iter()
        .filter(|present| *present)
        .count();

    match populated {
        3 => ParseStatus::Successful,
        0 => ParseStatus::Failed,
        _ => ParseStatus::PartialSuccess,
    }
}
