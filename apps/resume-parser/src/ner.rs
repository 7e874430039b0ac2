//! Named entity recognition used as the name strategy's fallback.
//!
//! Provides an `EntityRecognizer` trait for pluggable backends, a built-in
//! pattern-based recognizer tuned for resume headers, and a gazetteer-backed
//! recognizer loaded from a file of given names.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ParserError;

/// A single recognized entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Person,
    Organization,
}

/// Trait for pluggable NER backends. Entities come back in document order.
pub trait EntityRecognizer: Send + Sync {
    /// Human-readable backend identifier (e.g. "pattern", "gazetteer").
    fn backend_id(&self) -> &str;

    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// Loads the recognizer named by `NER_MODEL`.
///
/// `builtin` (or `pattern`) selects [`PatternRecognizer`]; anything else is
/// treated as the path of a gazetteer file. A model that cannot be loaded is
/// a `DependencyUnavailable` error.
pub fn load_recognizer(model: &str) -> Result<Box<dyn EntityRecognizer>, ParserError> {
    match model.trim() {
        "" | "builtin" | "pattern" => Ok(Box::new(PatternRecognizer)),
        path => {
            let recognizer = GazetteerRecognizer::from_file(Path::new(path))?;
            info!(
                "Loaded gazetteer NER model from {} ({} names)",
                path,
                recognizer.name_count()
            );
            Ok(Box::new(recognizer))
        }
    }
}

// ============================================================================
// Shared patterns
// ============================================================================

/// Two or three capitalized words, optionally with a middle initial.
static CAPITALIZED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z'\-]+(?:[ \t]+[A-Z]\.)?(?:[ \t]+[A-Z][a-z'\-]+){1,2})\b")
        .expect("capitalized name pattern should compile")
});

static TITLED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Dr|Mr|Mrs|Ms|Prof)\.?[ \t]+([A-Z][a-z'\-]+(?:[ \t]+[A-Z][a-z'\-]+){1,2})\b")
        .expect("titled name pattern should compile")
});

/// Words that appear capitalized in resumes but never inside a person's name.
static NON_NAME_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "resume", "curriculum", "vitae", "summary", "profile", "objective", "experience",
        "education", "skills", "projects", "certifications", "references", "contact",
        "professional", "technical", "work", "history", "employment", "languages", "awards",
        "publications", "interests", "engineer", "engineering", "developer", "manager",
        "analyst", "scientist", "designer", "consultant", "director", "intern", "senior",
        "junior", "lead", "principal", "staff", "software", "data", "product", "project",
        "university", "college", "institute", "school", "academy", "bachelor", "master",
        "science", "arts", "inc", "llc", "ltd", "corp", "corporation", "company", "group",
        "technologies", "solutions", "systems", "services", "street", "avenue", "road",
        "suite", "new", "san", "los", "united", "states", "january", "february", "march",
        "april", "may", "june", "july", "august", "september", "october", "november",
        "december", "present", "current",
    ]
    .into_iter()
    .collect()
});

static ORGANIZATION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z][A-Za-z&\-]+(?:[ \t]+[A-Z][A-Za-z&\-]+)*[ \t]+(?:Inc|LLC|Ltd|Corp|Corporation|University|College|Institute)\.?)",
    )
    .expect("organization pattern should compile")
});

fn contains_non_name_word(candidate: &str) -> bool {
    candidate
        .split_whitespace()
        .any(|w| NON_NAME_WORDS.contains(w.trim_end_matches('.').to_lowercase().as_str()))
}

fn push_unique(entities: &mut Vec<Entity>, seen: &mut HashSet<String>, text: &str, label: EntityLabel) {
    let text = text.trim().to_string();
    if seen.insert(text.clone()) {
        entities.push(Entity { text, label });
    }
}

// ============================================================================
// PatternRecognizer: built-in backend
// ============================================================================

/// Pattern-based recognizer. Persons are titled names or runs of capitalized
/// words free of resume vocabulary; organizations are capitalized runs ending
/// in a corporate or academic suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternRecognizer;

impl EntityRecognizer for PatternRecognizer {
    fn backend_id(&self) -> &str {
        "pattern"
    }

    fn recognize(&self, text: &str) -> Vec<Entity> {
        let mut seen = HashSet::new();
        let mut found: Vec<(usize, Entity)> = Vec::new();
        let mut record = |start: usize, raw: &str, label: EntityLabel| {
            let text = raw.trim().to_string();
            if seen.insert(text.clone()) {
                found.push((start, Entity { text, label }));
            }
        };

        for caps in ORGANIZATION_SUFFIX.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                record(m.start(), m.as_str(), EntityLabel::Organization);
            }
        }

        for caps in TITLED_NAME.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                record(m.start(), m.as_str(), EntityLabel::Person);
            }
        }

        for caps in CAPITALIZED_NAME.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                if !contains_non_name_word(m.as_str()) {
                    record(m.start(), m.as_str(), EntityLabel::Person);
                }
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, e)| e).collect()
    }
}

// ============================================================================
// GazetteerRecognizer: given-name list loaded from disk
// ============================================================================

/// Recognizes a person wherever a capitalized run starts with a known given name.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    given_names: HashSet<String>,
}

impl GazetteerRecognizer {
    /// One name per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self, ParserError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ParserError::DependencyUnavailable(format!(
                "NER model '{}' could not be loaded: {e}",
                path.display()
            ))
        })?;
        Self::from_names(contents.lines()).ok_or_else(|| {
            ParserError::DependencyUnavailable(format!(
                "NER model '{}' contains no names",
                path.display()
            ))
        })
    }

    /// Returns `None` when the list holds no usable names.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let given_names: HashSet<String> = names
            .into_iter()
            .map(str::trim)
            .filter(|n| !n.is_empty() && !n.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        if given_names.is_empty() {
            None
        } else {
            Some(Self { given_names })
        }
    }

    pub fn name_count(&self) -> usize {
        self.given_names.len()
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn backend_id(&self) -> &str {
        "gazetteer"
    }

    fn recognize(&self, text: &str) -> Vec<Entity> {
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for caps in CAPITALIZED_NAME.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let first = m.as_str().split_whitespace().next().unwrap_or_default();
            if self.given_names.contains(&first.to_lowercase()) {
                push_unique(&mut entities, &mut seen, m.as_str(), EntityLabel::Person);
            }
        }

        entities
    }
}
