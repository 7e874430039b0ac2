//! Field extraction strategies.
//!
//! Every strategy implements [`FieldExtractor`]: take resume text, return one
//! field value. The coordinator holds them as trait objects so any strategy
//! can be swapped without touching the caller.

use async_trait::async_trait;

use crate::errors::ParserError;

pub mod email;
pub mod name;
pub mod prompts;
pub mod skills;

pub use email::EmailExtractor;
pub use name::NameExtractor;
pub use skills::SkillsExtractor;

/// A single-field extraction strategy.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    type Output: Default + Send;

    /// Field name used in diagnostics ("name", "email", "skills").
    fn field(&self) -> &'static str;

    async fn extract(&self, text: &str) -> Result<Self::Output, ParserError>;
}

/// Rejects text that is empty after trimming.
pub(crate) fn ensure_text(text: &str) -> Result<(), ParserError> {
    if text.trim().is_empty() {
        return Err(ParserError::InvalidInput(
            "Cannot extract from empty text".to_string(),
        ));
    }
    Ok(())
}

/// The first `max_chars` characters of `text`, cut on a char boundary.
pub(crate) fn leading_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
