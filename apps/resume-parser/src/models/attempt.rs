use chrono::{DateTime, Local, NaiveDate};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::resume::ResumeRecord;

/// Outcome class of one parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Successful,
    PartialSuccess,
    Failed,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Successful => "successful",
            ParseStatus::PartialSuccess => "partial_success",
            ParseStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "successful" => Some(ParseStatus::Successful),
            "partial_success" => Some(ParseStatus::PartialSuccess),
            "failed" => Some(ParseStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger payload: `{name, email, skills}` in that key order, or `{}` when the
/// attempt produced no record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedData(pub Option<ResumeRecord>);

impl Serialize for ParsedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(record) => record.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl<'de> Deserialize<'de> for ParsedData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.as_object().is_some_and(|fields| fields.is_empty()) {
            return Ok(ParsedData(None));
        }
        ResumeRecord::deserialize(value)
            .map(|record| ParsedData(Some(record)))
            .map_err(serde::de::Error::custom)
    }
}

/// The ledger's unit of record: one per document processed.
/// Created when the attempt concludes and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub date: NaiveDate,
    pub timestamp: DateTime<Local>,
    pub filename: String,
    pub status: ParseStatus,
    pub record: Option<ResumeRecord>,
    pub explanation: String,
    /// Present only on failure.
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl AttemptRecord {
    /// ISO-8601 local timestamp without offset, microsecond precision.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }

    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn name_extracted(&self) -> &str {
        self.record.as_ref().map(|r| r.name()).unwrap_or("")
    }

    pub fn email_extracted(&self) -> &str {
        self.record.as_ref().map(|r| r.email()).unwrap_or("")
    }

    pub fn skills_count(&self) -> usize {
        self.record.as_ref().map(|r| r.skills().len()).unwrap_or(0)
    }

    pub fn parsed_data(&self) -> ParsedData {
        ParsedData(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ParseStatus::Successful,
            ParseStatus::PartialSuccess,
            ParseStatus::Failed,
        ] {
            assert_eq!(ParseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ParseStatus::parse("unknown"), None);
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&ParseStatus::PartialSuccess).unwrap();
        assert_eq!(json, r#""partial_success""#);
    }

    #[test]
    fn test_failed_attempt_accessors_default_to_empty() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let attempt = AttemptRecord {
            date: timestamp.date_naive(),
            timestamp,
            filename: "broken.pdf".to_string(),
            status: ParseStatus::Failed,
            record: None,
            explanation: "File not found".to_string(),
            error_kind: Some("NotFound".to_string()),
            error_message: Some("File not found: broken.pdf".to_string()),
        };
        assert_eq!(attempt.name_extracted(), "");
        assert_eq!(attempt.email_extracted(), "");
        assert_eq!(attempt.skills_count(), 0);
        assert_eq!(serde_json::to_string(&attempt.parsed_data()).unwrap(), "{}");
        assert_eq!(attempt.date_string(), "2024-03-05");
        assert_eq!(attempt.timestamp_string(), "2024-03-05T14:30:00.000000");
    }

    #[test]
    fn test_parsed_data_reads_back_empty_and_full() {
        let empty: ParsedData = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ParsedData(None));

        let full: ParsedData =
            serde_json::from_str(r#"{"skills":["Go"],"email":"a@b.io","name":"Ann Lee"}"#).unwrap();
        let record = full.0.unwrap();
        assert_eq!(record.name(), "Ann Lee");
        assert_eq!(record.skills(), ["Go"]);
    }
}
