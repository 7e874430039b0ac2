use std::path::PathBuf;

use thiserror::Error;

/// Application-level error type shared by the document adapters, the field
/// strategies, the coordinator and the result ledger.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot extract from empty text")]
    EmptyInput,

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("{0}")]
    FileUnreadable(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file format: {extension}. Supported formats: {supported}")]
    UnsupportedFormat { extension: String, supported: String },

    #[error("File size ({size_mb:.2}MB) exceeds maximum ({max_mb}MB)")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Transient backend failure: {0}")]
    TransientBackend(String),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse error class used when explaining a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parsing,
    Extraction,
    Api,
    Validation,
    Other,
}

impl ParserError {
    /// Stable variant name, recorded in the ledger's `error_type` column.
    pub fn kind(&self) -> &'static str {
        match self {
            ParserError::InvalidInput(_) => "InvalidInput",
            ParserError::EmptyInput => "EmptyInput",
            ParserError::DependencyUnavailable(_) => "DependencyUnavailable",
            ParserError::FileUnreadable(_) => "FileUnreadable",
            ParserError::NotFound(_) => "NotFound",
            ParserError::UnsupportedFormat { .. } => "UnsupportedFormat",
            ParserError::FileTooLarge { .. } => "FileTooLarge",
            ParserError::MalformedResponse(_) => "MalformedResponse",
            ParserError::TransientBackend(_) => "TransientBackend",
            ParserError::Backend(_) => "Backend",
            ParserError::Io(_) => "Io",
            ParserError::Json(_) => "Json",
            ParserError::Csv(_) => "Csv",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ParserError::FileUnreadable(_) | ParserError::NotFound(_) => ErrorCategory::Parsing,
            ParserError::InvalidInput(_)
            | ParserError::EmptyInput
            | ParserError::DependencyUnavailable(_)
            | ParserError::MalformedResponse(_) => ErrorCategory::Extraction,
            ParserError::TransientBackend(_) | ParserError::Backend(_) => ErrorCategory::Api,
            ParserError::UnsupportedFormat { .. } | ParserError::FileTooLarge { .. } => {
                ErrorCategory::Validation
            }
            ParserError::Io(_) | ParserError::Json(_) | ParserError::Csv(_) => {
                ErrorCategory::Other
            }
        }
    }
}
