//! Batch driver: parse every resume under an input path, one file at a time,
//! recording each outcome through a single `ResultLogger`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::documents::DocumentRegistry;
use crate::ledger::{LogSummary, ResultLogger};
use crate::models::AttemptRecord;
use crate::pipeline::ResumeParser;

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub attempts: Vec<AttemptRecord>,
    /// Strategy failures keyed by ledger filename, for files that still
    /// produced a record.
    pub field_errors: BTreeMap<String, BTreeMap<&'static str, String>>,
    pub session_file: PathBuf,
    pub summary: LogSummary,
}

/// A single file is returned as-is so an unsupported format still gets a
/// ledger row. A directory is searched recursively for supported extensions.
pub fn discover_documents(input: &Path, registry: &DocumentRegistry) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input path not found: {}", input.display());
    }

    let mut found = Vec::new();
    let mut pending = vec![input.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if registry.is_supported(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

/// Name recorded in the ledger: the path relative to the input folder, or the
/// bare file name when a single file was given.
fn display_name(path: &Path, input: &Path) -> String {
    let relative = if input.is_dir() {
        path.strip_prefix(input).unwrap_or(path)
    } else {
        path.file_name().map(Path::new).unwrap_or(path)
    };
    relative.to_string_lossy().replace('\\', "/")
}

pub async fn run_batch(parser: &ResumeParser, input: &Path, output_dir: &Path) -> Result<BatchReport> {
    let files = discover_documents(input, parser.registry())?;
    if files.is_empty() {
        bail!(
            "No resume files ({}) found in {}",
            parser.registry().supported().join(", "),
            input.display()
        );
    }
    info!("Found {} resume file(s) to process", files.len());

    let mut logger = ResultLogger::new(output_dir)
        .with_context(|| format!("Failed to open result ledger in {}", output_dir.display()))?;
    info!("Recording results to {}", logger.csv_file().display());

    let mut attempts = Vec::with_capacity(files.len());
    let mut field_errors = BTreeMap::new();
    for (index, path) in files.iter().enumerate() {
        let name = display_name(path, input);
        info!("[{}/{}] Processing {}", index + 1, files.len(), name);
        let started = Instant::now();

        let attempt = match parser.parse_resume(path).await {
            Ok(extraction) => {
                let logged = logger.log_result(&name, Some(&extraction.record), None);
                if !extraction.is_clean() {
                    for (field, message) in &extraction.field_errors {
                        warn!("{}: {} extraction failed: {}", name, field, message);
                    }
                    field_errors.insert(name.clone(), extraction.field_errors);
                }
                logged
            }
            Err(e) => {
                warn!("Parsing {} failed: {}", name, e);
                logger.log_result(&name, None, Some(&e))
            }
        }
        .with_context(|| format!("Failed to record result for {name}"))?;

        info!(
            "[{}/{}] {} -> {} in {:.2}s",
            index + 1,
            files.len(),
            name,
            attempt.status,
            started.elapsed().as_secs_f64()
        );
        attempts.push(attempt);
    }

    let summary = logger.get_summary().context("Failed to summarize ledger")?;
    Ok(BatchReport {
        attempts,
        field_errors,
        session_file: logger.session_file().to_path_buf(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::ResumeExtractor;
    use crate::documents::DocumentParser;
    use crate::errors::ParserError;
    use crate::extractors::{EmailExtractor, FieldExtractor, NameExtractor};
    use crate::models::ParseStatus;
    use crate::ner::PatternRecognizer;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct PlainText;

    impl DocumentParser for PlainText {
        fn format_name(&self) -> &'static str {
            "text"
        }

        fn parse(&self, path: &Path) -> Result<String, ParserError> {
            Ok(fs::read_to_string(path)?)
        }
    }

    struct NoSkills;

    #[async_trait]
    impl FieldExtractor for NoSkills {
        type Output = Vec<String>;

        fn field(&self) -> &'static str {
            "skills"
        }

        async fn extract(&self, _text: &str) -> Result<Vec<String>, ParserError> {
            Err(ParserError::TransientBackend("connection refused".to_string()))
        }
    }

    fn parser() -> ResumeParser {
        ResumeParser::new(
            DocumentRegistry::default().with_parser(".txt", Arc::new(PlainText)),
            ResumeExtractor::new(
                Box::new(NameExtractor::new(Box::new(PatternRecognizer))),
                Box::new(EmailExtractor::new()),
                Box::new(NoSkills),
            ),
        )
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_discovery_is_recursive_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b.pdf"), "x");
        write(&dir.path().join("nested/a.DOCX"), "x");
        write(&dir.path().join("notes.md"), "x");

        let found = discover_documents(dir.path(), &DocumentRegistry::default()).unwrap();
        let names: Vec<String> = found.iter().map(|p| display_name(p, dir.path())).collect();
        assert_eq!(names, vec!["b.pdf", "nested/a.DOCX"]);
    }

    #[test]
    fn test_discovery_of_missing_path_fails() {
        assert!(discover_documents(Path::new("/no/such/input"), &DocumentRegistry::default()).is_err());
    }

    #[tokio::test]
    async fn test_run_batch_logs_every_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(&input.path().join("jane.txt"), "Jane Doe\njane@acme.io\n");
        write(&input.path().join("edge_cases/minimal.txt"), "Sam Lee\n");
        write(&input.path().join("edge_cases/blank.txt"), "   ");

        let report = run_batch(&parser(), input.path(), output.path()).await.unwrap();

        let outcomes: Vec<(&str, ParseStatus)> = report
            .attempts
            .iter()
            .map(|a| (a.filename.as_str(), a.status))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("edge_cases/blank.txt", ParseStatus::Failed),
                ("edge_cases/minimal.txt", ParseStatus::PartialSuccess),
                ("jane.txt", ParseStatus::PartialSuccess),
            ]
        );
        assert!(report.attempts[1]
            .explanation
            .ends_with("Edge case: Minimal content resume"));
        let failed_fields: Vec<&str> = report.field_errors.keys().map(String::as_str).collect();
        assert_eq!(failed_fields, vec!["edge_cases/minimal.txt", "jane.txt"]);
        assert!(report.field_errors["jane.txt"]["skills"].contains("connection refused"));
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.partial_success, 2);
        assert_eq!(report.summary.failed, 1);
        assert!(report.session_file.exists());
    }

    #[tokio::test]
    async fn test_single_unsupported_file_is_logged_as_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let path = input.path().join("resume.rtf");
        write(&path, "{\\rtf1 Jane}");

        let report = run_batch(&parser(), &path, output.path()).await.unwrap();
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.attempts[0].filename, "resume.rtf");
        assert_eq!(report.attempts[0].error_kind.as_deref(), Some("UnsupportedFormat"));
        assert!(report.attempts[0].explanation.starts_with("Validation error:"));
    }

    #[tokio::test]
    async fn test_empty_folder_is_an_error() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        assert!(run_batch(&parser(), input.path(), output.path()).await.is_err());
    }
}
