use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{debug, error, info, warn};

use super::{validate_file, DocumentParser};
use crate::errors::ParserError;

/// PDF text extraction backed by `pdf-extract`.
pub struct PdfParser {
    max_file_size_mb: u64,
}

impl PdfParser {
    pub fn new(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }

    fn extract(bytes: &[u8]) -> Result<String, String> {
        // pdf-extract panics on some malformed inputs instead of returning an error.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "PDF backend panicked".to_string())
}

/// Whether the trailer references an encryption dictionary.
fn has_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

impl DocumentParser for PdfParser {
    fn format_name(&self) -> &'static str {
        "PDF"
    }

    fn parse(&self, path: &Path) -> Result<String, ParserError> {
        validate_file(path, self.max_file_size_mb)?;
        info!("Parsing PDF file: {}", path.display());

        let bytes = std::fs::read(path)?;
        let encrypted = has_encrypt_marker(&bytes);
        if encrypted {
            warn!("PDF is encrypted: {}", path.display());
        }

        let encrypted_error = |detail: &str| {
            ParserError::FileUnreadable(format!(
                "Cannot decrypt PDF: {}. The file is encrypted and requires a password. Error: {detail}",
                path.display()
            ))
        };

        let text = Self::extract(&bytes).map_err(|e| {
            error!("Error parsing PDF {}: {}", path.display(), e);
            if encrypted {
                encrypted_error(&e)
            } else {
                ParserError::FileUnreadable(format!(
                    "Failed to parse PDF: {e}. The file may be corrupted"
                ))
            }
        })?;

        if text.trim().is_empty() {
            if encrypted {
                return Err(encrypted_error("no readable text"));
            }
            return Err(ParserError::FileUnreadable(format!(
                "No text content extracted from PDF: {}. The PDF may be image-based or corrupted.",
                path.display()
            )));
        }

        debug!("Extracted PDF text spans {} pages", text.matches('\x0C').count() + 1);
        info!("Successfully extracted {} characters from PDF", text.len());
        Ok(text)
    }
}
