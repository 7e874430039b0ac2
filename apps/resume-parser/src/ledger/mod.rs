//! Result ledger: every parse attempt is recorded twice.
//!
//! - `csv/parsing_log.csv` is a single append-only table shared by every
//!   logger pointed at the same output directory.
//! - `json/parsing_log_<timestamp>.json` belongs to one logger instance. It is
//!   created on the first `log_result` call, with a `_N` suffix if another
//!   logger already owns the name, and rewritten in full on each later call.
//!
//! Neither file is locked; one writer per output directory is assumed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ParserError;
use crate::models::{AttemptRecord, ParseStatus, ParsedData, ResumeRecord};

pub mod explanation;
pub mod status;

pub use explanation::explain;
pub use status::classify_status;

pub const CSV_FILE_NAME: &str = "parsing_log.csv";
const SESSION_PREFIX: &str = "parsing_log_";

pub const CSV_HEADER: [&str; 11] = [
    "date",
    "timestamp",
    "filename",
    "status",
    "json_output",
    "reasons_explanations",
    "name_extracted",
    "email_extracted",
    "skills_count",
    "error_type",
    "error_message",
];

/// One element of the session file's JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub date: String,
    pub timestamp: String,
    pub filename: String,
    pub status: ParseStatus,
    pub parsed_data: ParsedData,
    pub reasons_explanations: String,
    pub name_extracted: String,
    pub email_extracted: String,
    pub skills_count: usize,
    pub error_type: String,
    pub error_message: String,
}

impl From<&AttemptRecord> for SessionEntry {
    fn from(attempt: &AttemptRecord) -> Self {
        Self {
            date: attempt.date_string(),
            timestamp: attempt.timestamp_string(),
            filename: attempt.filename.clone(),
            status: attempt.status,
            parsed_data: attempt.parsed_data(),
            reasons_explanations: attempt.explanation.clone(),
            name_extracted: attempt.name_extracted().to_string(),
            email_extracted: attempt.email_extracted().to_string(),
            skills_count: attempt.skills_count(),
            error_type: attempt.error_kind.clone().unwrap_or_default(),
            error_message: attempt.error_message.clone().unwrap_or_default(),
        }
    }
}

/// Status counts re-derived from the CSV ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    pub total: usize,
    pub successful: usize,
    pub partial_success: usize,
    pub failed: usize,
    pub csv_file: PathBuf,
    /// Most recently modified session file, possibly from an earlier run.
    pub json_file: Option<PathBuf>,
}

pub struct ResultLogger {
    csv_file: PathBuf,
    json_dir: PathBuf,
    session_file: PathBuf,
    session_started: bool,
}

impl ResultLogger {
    /// Creates `csv/` and `json/` under `output_dir` and writes the CSV header
    /// if the ledger does not exist yet. The session file is not created here.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ParserError> {
        let output_dir = output_dir.as_ref();
        let csv_dir = output_dir.join("csv");
        let json_dir = output_dir.join("json");
        fs::create_dir_all(&csv_dir)?;
        fs::create_dir_all(&json_dir)?;

        let csv_file = csv_dir.join(CSV_FILE_NAME);
        let session_name = format!(
            "{SESSION_PREFIX}{}.json",
            Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let session_file = json_dir.join(session_name);

        let logger = Self {
            csv_file,
            json_dir,
            session_file,
            session_started: false,
        };
        logger.initialize_csv()?;
        Ok(logger)
    }

    pub fn csv_file(&self) -> &Path {
        &self.csv_file
    }

    /// Path this logger writes its session to. May not exist yet, and is
    /// final only after the first `log_result` call.
    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    fn initialize_csv(&self) -> Result<(), ParserError> {
        let needs_header = fs::metadata(&self.csv_file)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        if needs_header {
            let mut writer = csv::Writer::from_path(&self.csv_file)?;
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
            debug!("Created ledger {}", self.csv_file.display());
        }
        Ok(())
    }

    /// Records one attempt in both stores and returns it.
    pub fn log_result(
        &mut self,
        filename: &str,
        record: Option<&ResumeRecord>,
        error: Option<&ParserError>,
    ) -> Result<AttemptRecord, ParserError> {
        let now = Local::now();
        let attempt = AttemptRecord {
            date: now.date_naive(),
            timestamp: now,
            filename: filename.to_string(),
            status: classify_status(record, error),
            record: record.cloned(),
            explanation: explain(record, error, filename),
            error_kind: error.map(|e| e.kind().to_string()),
            error_message: error.map(|e| e.to_string()),
        };

        self.append_csv(&attempt)?;
        self.append_session(&attempt)?;

        info!(
            "Logged {} as {} ({})",
            attempt.filename, attempt.status, attempt.explanation
        );
        Ok(attempt)
    }

    fn append_csv(&self, attempt: &AttemptRecord) -> Result<(), ParserError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_file)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let json_output = serde_json::to_string(&attempt.parsed_data())?;
        writer.write_record([
            attempt.date_string().as_str(),
            attempt.timestamp_string().as_str(),
            attempt.filename.as_str(),
            attempt.status.as_str(),
            json_output.as_str(),
            attempt.explanation.as_str(),
            attempt.name_extracted(),
            attempt.email_extracted(),
            attempt.skills_count().to_string().as_str(),
            attempt.error_kind.as_deref().unwrap_or(""),
            attempt.error_message.as_deref().unwrap_or(""),
        ])?;
        writer.flush()?;
        Ok(())
    }

    fn append_session(&mut self, attempt: &AttemptRecord) -> Result<(), ParserError> {
        if !self.session_started {
            let body = serde_json::to_string_pretty(&[SessionEntry::from(attempt)])?;
            let mut file = self.claim_session_file()?;
            file.write_all(body.as_bytes())?;
            debug!("Created session log {}", self.session_file.display());
            self.session_started = true;
            return Ok(());
        }

        let mut entries: Vec<SessionEntry> =
            serde_json::from_str(&fs::read_to_string(&self.session_file)?)?;
        entries.push(SessionEntry::from(attempt));
        fs::write(&self.session_file, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }

    /// Creates the session file without touching a file another logger owns,
    /// moving to `<stem>_1.json`, `<stem>_2.json`, ... until a name is free.
    fn claim_session_file(&mut self) -> Result<File, ParserError> {
        let stem = self
            .session_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| SESSION_PREFIX.to_string());

        let mut suffix = 0u32;
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.session_file)
            {
                Ok(file) => return Ok(file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    self.session_file = self.json_dir.join(format!("{stem}_{suffix}.json"));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Counts statuses by re-reading the CSV ledger's `status` column.
    pub fn get_summary(&self) -> Result<LogSummary, ParserError> {
        summarize(&self.csv_file, &self.json_dir)
    }
}

/// Summary for an output directory without constructing a logger.
pub fn summarize_output_dir(output_dir: impl AsRef<Path>) -> Result<LogSummary, ParserError> {
    let output_dir = output_dir.as_ref();
    summarize(
        &output_dir.join("csv").join(CSV_FILE_NAME),
        &output_dir.join("json"),
    )
}

fn summarize(csv_file: &Path, json_dir: &Path) -> Result<LogSummary, ParserError> {
    let mut summary = LogSummary {
        total: 0,
        successful: 0,
        partial_success: 0,
        failed: 0,
        csv_file: csv_file.to_path_buf(),
        json_file: latest_session_file(json_dir)?,
    };

    if !csv_file.exists() {
        return Ok(summary);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_file)?;
    let Some(status_index) = reader.headers()?.iter().position(|h| h == "status") else {
        return Ok(summary);
    };

    for row in reader.records() {
        let row = row?;
        match row.get(status_index).and_then(ParseStatus::parse) {
            Some(ParseStatus::Successful) => summary.successful += 1,
            Some(ParseStatus::PartialSuccess) => summary.partial_success += 1,
            Some(ParseStatus::Failed) => summary.failed += 1,
            None => continue,
        }
        summary.total += 1;
    }

    Ok(summary)
}

fn latest_session_file(json_dir: &Path) -> Result<Option<PathBuf>, ParserError> {
    if !json_dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(json_dir)? {
        let path = entry?.path();
        let is_session = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(SESSION_PREFIX) && n.ends_with(".json"));
        if !is_session {
            continue;
        }
        let modified = fs::metadata(&path)?.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
