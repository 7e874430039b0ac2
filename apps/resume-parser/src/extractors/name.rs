use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use super::{ensure_text, leading_chars, FieldExtractor};
use crate::config::Config;
use crate::errors::ParserError;
use crate::ner::{load_recognizer, EntityLabel, EntityRecognizer};

/// Leading slice of the text scanned by the header heuristic.
const HEADER_CHARS: usize = 500;
const HEADER_LINES: usize = 5;
/// Leading slice handed to the entity recognizer.
const NER_CHARS: usize = 1000;

const CONTACT_KEYWORDS: &[&str] = &["email", "phone", "address", "linkedin", "github", "http", "@"];

static NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z\s\-'.]+$").expect("name character pattern should compile")
});

/// Two-phase name strategy: header heuristic first, entity recognition second.
pub struct NameExtractor {
    recognizer: Box<dyn EntityRecognizer>,
}

impl NameExtractor {
    pub fn new(recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Loads the recognizer named by `NER_MODEL`. Fails here, never at call time.
    pub fn from_config(config: &Config) -> Result<Self, ParserError> {
        let recognizer = load_recognizer(&config.ner_model)?;
        info!(
            "Initialized NameExtractor with {} recognizer",
            recognizer.backend_id()
        );
        Ok(Self::new(recognizer))
    }

    pub fn find(&self, text: &str) -> Result<String, ParserError> {
        ensure_text(text)?;

        if let Some(name) = name_from_header(leading_chars(text, HEADER_CHARS)) {
            info!("Extracted name from header: {}", name);
            return Ok(name.to_string());
        }

        if let Some(name) = self.name_from_entities(leading_chars(text, NER_CHARS)) {
            info!("Extracted name using NER: {}", name);
            return Ok(name);
        }

        warn!("No valid name found in resume");
        Ok(String::new())
    }

    fn name_from_entities(&self, text: &str) -> Option<String> {
        self.recognizer
            .recognize(text)
            .into_iter()
            .filter(|e| e.label == EntityLabel::Person)
            .map(|e| e.text.trim().to_string())
            .find(|candidate| is_valid_name(candidate))
    }
}

fn name_from_header(header: &str) -> Option<&str> {
    header
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(HEADER_LINES)
        .filter(|line| {
            let lower = line.to_lowercase();
            !CONTACT_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .find(|line| is_valid_name(line))
}

/// Name shape: uppercase start, letters/spaces/hyphens/apostrophes/periods
/// only, 2 to 5 words of 2 to 20 characters each.
pub fn is_valid_name(candidate: &str) -> bool {
    let candidate = candidate.trim();
    let Some(first) = candidate.chars().next() else {
        return false;
    };
    if !first.is_ascii_uppercase() || !NAME_CHARS.is_match(candidate) {
        return false;
    }

    let words: Vec<&str> = candidate.split_whitespace().collect();
    (2..=5).contains(&words.len()) && words.iter().all(|w| (2..=20).contains(&w.len()))
}

#[async_trait]
impl FieldExtractor for NameExtractor {
    type Output = String;

    fn field(&self) -> &'static str {
        "name"
    }

    async fn extract(&self, text: &str) -> Result<String, ParserError> {
        self.find(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::{Entity, PatternRecognizer};

    /// Recognizer that returns a fixed entity list regardless of input.
    struct FixedRecognizer(Vec<Entity>);

    impl EntityRecognizer for FixedRecognizer {
        fn backend_id(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }
    }

    fn person(text: &str) -> Entity {
        Entity {
            text: text.to_string(),
            label: EntityLabel::Person,
        }
    }

    fn extractor() -> NameExtractor {
        NameExtractor::new(Box::new(PatternRecognizer))
    }

    #[test]
    fn test_is_valid_name_rules() {
        assert!(is_valid_name("Jane Doe"));
        assert!(is_valid_name("Mary-Kate O'Neil"));
        assert!(is_valid_name("John Q. Public"));
        assert!(!is_valid_name("jane doe"));
        assert!(!is_valid_name("Madonna"));
        assert!(!is_valid_name("One Two Three Four Five Six"));
        assert!(!is_valid_name("Jane D"));
        assert!(!is_valid_name("Jane Doe 3rd"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_header_first_line() {
        let text = "Jane Doe\njane@acme.io\nSoftware Engineer";
        assert_eq!(extractor().find(text).unwrap(), "Jane Doe");
    }

    #[test]
    fn test_header_skips_contact_lines() {
        let text = "\n\nEmail Address Here\nPhone Number Line\nAlan Turing\n";
        assert_eq!(extractor().find(text).unwrap(), "Alan Turing");
    }

    #[test]
    fn test_header_only_scans_five_non_empty_lines() {
        let text = "resume\n2024\nx\ny\nz\nJane Doe\n";
        let fallback = NameExtractor::new(Box::new(FixedRecognizer(vec![])));
        assert_eq!(fallback.find(text).unwrap(), "");
    }

    #[test]
    fn test_falls_back_to_recognizer() {
        let recognizer = FixedRecognizer(vec![
            Entity {
                text: "Acme Corp".to_string(),
                label: EntityLabel::Organization,
            },
            person("x"),
            person("Grace Hopper"),
        ]);
        let extractor = NameExtractor::new(Box::new(recognizer));
        let text = "CURRICULUM VITAE 2024\ncontact: grace@navy.mil";
        assert_eq!(extractor.find(text).unwrap(), "Grace Hopper");
    }

    #[test]
    fn test_no_name_anywhere_is_empty() {
        let extractor = NameExtractor::new(Box::new(FixedRecognizer(vec![])));
        assert_eq!(extractor.find("skills: rust, go, sql").unwrap(), "");
    }

    #[test]
    fn test_empty_text_is_invalid_input() {
        assert!(matches!(
            extractor().find(""),
            Err(ParserError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_from_config_missing_model_fails_at_construction() {
        let mut config = crate::config::Config::from_lookup(|_| None).unwrap();
        config.ner_model = "/definitely/not/here.txt".to_string();
        assert!(matches!(
            NameExtractor::from_config(&config),
            Err(ParserError::DependencyUnavailable(_))
        ));
    }
}
