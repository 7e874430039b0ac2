//! Document adapters: turn a file on disk into plain text.
//!
//! Each format is a [`DocumentParser`]; the [`DocumentRegistry`] dispatches
//! on the lowercased file extension.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error};

use crate::config::Config;
use crate::errors::ParserError;

pub mod docx;
pub mod pdf;

pub use docx::DocxParser;
pub use pdf::PdfParser;

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Extracts the full text of one document format.
pub trait DocumentParser: Send + Sync {
    /// Format name used in logs ("PDF", "Word document").
    fn format_name(&self) -> &'static str;

    fn parse(&self, path: &Path) -> Result<String, ParserError>;
}

/// Checks that `path` is an existing regular file no larger than `max_mb`.
pub fn validate_file(path: &Path, max_mb: u64) -> Result<(), ParserError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("File not found: {}", path.display());
            return Err(ParserError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        error!("Path is not a file: {}", path.display());
        return Err(ParserError::FileUnreadable(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    let size_mb = metadata.len() as f64 / BYTES_PER_MB as f64;
    if metadata.len() > max_mb.saturating_mul(BYTES_PER_MB) {
        return Err(ParserError::FileTooLarge {
            size_mb,
            max_mb,
        });
    }
    Ok(())
}

/// Lowercased extension with its leading dot, or an empty string.
pub fn normalize_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Extension-keyed table of document parsers.
#[derive(Clone)]
pub struct DocumentRegistry {
    parsers: HashMap<String, Arc<dyn DocumentParser>>,
}

impl DocumentRegistry {
    /// Registry with the built-in `.pdf` and `.docx` parsers.
    pub fn new(max_file_size_mb: u64) -> Self {
        Self::empty()
            .with_parser(".pdf", Arc::new(PdfParser::new(max_file_size_mb)))
            .with_parser(".docx", Arc::new(DocxParser::new(max_file_size_mb)))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_size_mb)
    }

    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the parser for `extension`. The leading dot
    /// and case are optional.
    pub fn with_parser(mut self, extension: &str, parser: Arc<dyn DocumentParser>) -> Self {
        let key = format!(".{}", extension.trim_start_matches('.').to_lowercase());
        self.parsers.insert(key, parser);
        self
    }

    /// Supported extensions, sorted.
    pub fn supported(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.parsers.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.parsers.contains_key(&normalize_extension(path))
    }

    pub fn parser_for(&self, path: &Path) -> Result<Arc<dyn DocumentParser>, ParserError> {
        let extension = normalize_extension(path);
        self.parsers
            .get(&extension)
            .cloned()
            .ok_or_else(|| ParserError::UnsupportedFormat {
                extension,
                supported: self.supported().join(", "),
            })
    }

    /// Existence is checked before format, so a missing `.txt` reports
    /// `NotFound` rather than `UnsupportedFormat`.
    pub fn extract_text(&self, path: &Path) -> Result<String, ParserError> {
        if !path.exists() {
            error!("File not found: {}", path.display());
            return Err(ParserError::NotFound(path.to_path_buf()));
        }

        let parser = self.parser_for(path)?;
        debug!("Dispatching {} to {} parser", path.display(), parser.format_name());
        parser.parse(path)
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct PlainText;

    impl DocumentParser for PlainText {
        fn format_name(&self) -> &'static str {
            "text"
        }

        fn parse(&self, path: &Path) -> Result<String, ParserError> {
            Ok(std::fs::read_to_string(path)?)
        }
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(Path::new("a/B.PDF")), ".pdf");
        assert_eq!(normalize_extension(Path::new("cv.Docx")), ".docx");
        assert_eq!(normalize_extension(Path::new("README")), "");
    }

    #[test]
    fn test_default_supports_pdf_and_docx() {
        let registry = DocumentRegistry::default();
        assert_eq!(registry.supported(), vec![".docx", ".pdf"]);
        assert!(registry.is_supported(Path::new("x/Resume.PDF")));
        assert!(!registry.is_supported(Path::new("notes.txt")));
    }

    #[test]
    fn test_missing_file_is_not_found_before_format_check() {
        let registry = DocumentRegistry::default();
        let err = registry
            .extract_text(Path::new("/no/such/dir/resume.txt"))
            .unwrap_err();
        assert!(matches!(err, ParserError::NotFound(p) if p == PathBuf::from("/no/such/dir/resume.txt")));
    }

    #[test]
    fn test_unsupported_format_lists_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe").unwrap();

        let err = DocumentRegistry::default().extract_text(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file format: .txt. Supported formats: .docx, .pdf"
        );
    }

    #[test]
    fn test_custom_parser_registration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.TXT");
        std::fs::write(&path, "Jane Doe\njane@acme.io").unwrap();

        let registry = DocumentRegistry::default().with_parser("txt", Arc::new(PlainText));
        assert_eq!(registry.extract_text(&path).unwrap(), "Jane Doe\njane@acme.io");
    }

    #[test]
    fn test_validate_file_rules() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_file(dir.path(), 10),
            Err(ParserError::FileUnreadable(_))
        ));

        let path = dir.path().join("big.pdf");
        std::fs::write(&path, vec![0u8; 2 * 1024 * 1024]).unwrap();
        assert!(validate_file(&path, 2).is_ok());
        assert!(matches!(
            validate_file(&path, 1),
            Err(ParserError::FileTooLarge { max_mb: 1, .. })
        ));
    }

    #[test]
    fn test_huge_size_limit_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        assert!(validate_file(&path, u64::MAX).is_ok());
    }
}
