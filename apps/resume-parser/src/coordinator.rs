//! Extraction coordinator: runs every field strategy over the same text and
//! isolates failures per field.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::ParserError;
use crate::extractors::{EmailExtractor, FieldExtractor, NameExtractor, SkillsExtractor};
use crate::models::ResumeRecord;

pub type TextExtractor = Box<dyn FieldExtractor<Output = String>>;
pub type ListExtractor = Box<dyn FieldExtractor<Output = Vec<String>>>;

/// A record plus the error message of every strategy that failed.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ResumeRecord,
    pub field_errors: BTreeMap<&'static str, String>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.field_errors.is_empty()
    }
}

pub struct ResumeExtractor {
    name: TextExtractor,
    email: TextExtractor,
    skills: ListExtractor,
}

impl ResumeExtractor {
    pub fn new(name: TextExtractor, email: TextExtractor, skills: ListExtractor) -> Self {
        Self {
            name,
            email,
            skills,
        }
    }

    /// Wires up the default strategies. Fails if the NER model or the LLM
    /// client cannot be initialized.
    pub fn from_config(config: &Config) -> Result<Self, ParserError> {
        let extractor = Self::new(
            Box::new(NameExtractor::from_config(config)?),
            Box::new(EmailExtractor::new()),
            Box::new(SkillsExtractor::from_config(config)?),
        );
        info!("ResumeExtractor initialized with all field extractors");
        Ok(extractor)
    }

    /// Extracts all fields. Never fails once the text is non-empty: a failing
    /// strategy contributes its field's empty value and an entry in
    /// `field_errors`.
    pub async fn extract(&self, text: &str) -> Result<Extraction, ParserError> {
        if text.trim().is_empty() {
            return Err(ParserError::EmptyInput);
        }

        info!("Starting extraction of all fields");
        let mut field_errors = BTreeMap::new();

        let name = run_field(&*self.name, text, &mut field_errors).await;
        let email = run_field(&*self.email, text, &mut field_errors).await;
        let skills = run_field(&*self.skills, text, &mut field_errors).await;

        let record = ResumeRecord::new(name, email, skills);

        if record.is_empty() {
            warn!("All extractions returned empty results");
        } else {
            info!(
                "Extraction complete: name={}, email={}, skills={}",
                record.has_name(),
                record.has_email(),
                record.skills().len()
            );
        }
        if !field_errors.is_empty() {
            warn!("Extraction had errors: {:?}", field_errors);
        }

        Ok(Extraction {
            record,
            field_errors,
        })
    }
}

async fn run_field<T: Default + Send>(
    extractor: &dyn FieldExtractor<Output = T>,
    text: &str,
    errors: &mut BTreeMap<&'static str, String>,
) -> T {
    match extractor.extract(text).await {
        Ok(value) => value,
        Err(e) => {
            error!("{} extraction failed: {}", extractor.field(), e);
            errors.insert(extractor.field(), e.to_string());
            T::default()
        }
    }
}
