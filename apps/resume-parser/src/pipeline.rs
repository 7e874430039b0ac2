//! Public entry point: file path in, normalized record out.

use std::path::Path;

use tracing::{error, info};

use crate::config::Config;
use crate::coordinator::{Extraction, ResumeExtractor};
use crate::documents::DocumentRegistry;
use crate::errors::ParserError;

pub struct ResumeParser {
    registry: DocumentRegistry,
    extractor: ResumeExtractor,
}

impl ResumeParser {
    pub fn new(registry: DocumentRegistry, extractor: ResumeExtractor) -> Self {
        info!(
            "Initialized ResumeParser (formats: {})",
            registry.supported().join(", ")
        );
        Self {
            registry,
            extractor,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ParserError> {
        Ok(Self::new(
            DocumentRegistry::from_config(config),
            ResumeExtractor::from_config(config)?,
        ))
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    /// Reads the document and extracts every field. Per-field strategy
    /// failures come back in [`Extraction::field_errors`], not as `Err`.
    pub async fn parse_resume(&self, path: &Path) -> Result<Extraction, ParserError> {
        info!("{}", "=".repeat(60));
        info!("Starting resume parsing: {}", path.display());
        info!("{}", "=".repeat(60));

        let text = self.read_text(path).await.map_err(|e| {
            error!("Parsing error: {}", e);
            e
        })?;
        info!("Extracted {} characters of text", text.chars().count());

        let extraction = self.extractor.extract(&text).await?;
        let record = &extraction.record;

        info!("{}", "=".repeat(60));
        info!("Resume parsing completed successfully");
        info!(
            name = record.name(),
            email = record.email(),
            skills = ?record.skills(),
            "Results"
        );
        info!("{}", "=".repeat(60));
        Ok(extraction)
    }

    /// Document decoding is CPU-bound, so it runs on the blocking pool.
    async fn read_text(&self, path: &Path) -> Result<String, ParserError> {
        let registry = self.registry.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || registry.extract_text(&path))
            .await
            .map_err(|e| ParserError::FileUnreadable(format!("Failed to parse document: {e}")))?
    }
}
