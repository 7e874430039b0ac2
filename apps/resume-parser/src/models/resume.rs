use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Canonical output of one parsed resume.
///
/// Normalization happens exactly once, in [`ResumeRecord::new`]:
/// - `name`: whitespace runs collapsed to single spaces, trimmed
/// - `email`: trimmed and lowercased; empty string means "not found"
/// - `skills`: trimmed, empties dropped, case-insensitive duplicates removed
///   keeping the first occurrence and its casing, source order preserved
///
/// Fields are private so a record cannot be mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawResumeFields")]
pub struct ResumeRecord {
    name: String,
    email: String,
    skills: Vec<String>,
}

/// Un-normalized field values as they arrive from strategies or from JSON.
#[derive(Debug, Deserialize)]
struct RawResumeFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    skills: Vec<String>,
}

impl From<RawResumeFields> for ResumeRecord {
    fn from(raw: RawResumeFields) -> Self {
        ResumeRecord::new(raw.name, raw.email, raw.skills)
    }
}

impl ResumeRecord {
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>, skills: Vec<String>) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            email: email.as_ref().trim().to_lowercase(),
            skills: normalize_skills(skills),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }

    pub fn has_skills(&self) -> bool {
        !self.skills.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_name() && !self.has_email() && !self.has_skills()
    }
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_skills(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|skill| {
            let trimmed = skill.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                return None;
            }
            Some(trimmed.to_string())
        })
        .collect()
}
