use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use super::{ensure_text, FieldExtractor};
use crate::errors::ParserError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern should compile")
});

/// Placeholder domains that never belong to a real candidate.
const PLACEHOLDER_DOMAINS: &[&str] = &["example.com", "test.com", "domain.com"];

/// Regex email strategy: the first address in the text, unless it is a placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailExtractor;

impl EmailExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core, also used directly by tests.
    pub fn find(&self, text: &str) -> Result<String, ParserError> {
        ensure_text(text)?;

        let Some(found) = EMAIL_PATTERN.find(text) else {
            debug!("No email address found in text");
            return Ok(String::new());
        };

        let email = found.as_str();
        if is_placeholder(email) {
            info!("Ignoring placeholder email address: {}", email);
            return Ok(String::new());
        }

        info!("Extracted email: {}", email);
        Ok(email.to_string())
    }
}

fn is_placeholder(email: &str) -> bool {
    let domain = email
        .rsplit_once('@')
        .map(|(_, d)| d.to_lowercase())
        .unwrap_or_default();
    PLACEHOLDER_DOMAINS
        .iter()
        .any(|p| domain == *p || domain.ends_with(&format!(".{p}")))
}

#[async_trait]
impl FieldExtractor for EmailExtractor {
    type Output = String;

    fn field(&self) -> &'static str {
        "email"
    }

    async fn extract(&self, text: &str) -> Result<String, ParserError> {
        self.find(text)
    }
}
