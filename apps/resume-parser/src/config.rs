use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const VALID_LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// Application configuration loaded from environment variables.
/// Built once at startup and passed by reference into constructors.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional at load time; the skills strategy refuses to start without it.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub openai_timeout_secs: u64,
    pub max_skills_returned: usize,
    /// `builtin` for the pattern recognizer, otherwise a path to a gazetteer file.
    pub ner_model: String,
    pub output_dir: PathBuf,
    pub max_file_size_mb: u64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_temperature: f32 = parse_or(&get, "OPENAI_TEMPERATURE", 0.1)?;
        if !(0.0..=2.0).contains(&openai_temperature) {
            bail!("OPENAI_TEMPERATURE must be between 0 and 2, got {openai_temperature}");
        }

        let log_level = get("LOG_LEVEL")
            .unwrap_or_else(|| "INFO".to_string())
            .to_uppercase();
        // Accept the Python-style aliases some deployments still carry.
        let log_level = match log_level.as_str() {
            "WARNING" => "WARN".to_string(),
            "CRITICAL" => "ERROR".to_string(),
            _ => log_level,
        };
        if !VALID_LOG_LEVELS.contains(&log_level.as_str()) {
            bail!("LOG_LEVEL must be one of {VALID_LOG_LEVELS:?}, got '{log_level}'");
        }

        Ok(Config {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4-turbo-preview".to_string()),
            openai_max_tokens: parse_or(&get, "OPENAI_MAX_TOKENS", 1000)?,
            openai_temperature,
            openai_timeout_secs: parse_or(&get, "OPENAI_TIMEOUT_SECS", 120)?,
            max_skills_returned: parse_or(&get, "MAX_SKILLS_RETURNED", 20)?,
            ner_model: get("NER_MODEL").unwrap_or_else(|| "builtin".to_string()),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("outputs")),
            max_file_size_mb: parse_or(&get, "MAX_FILE_SIZE_MB", 10)?,
            log_level,
            log_file: get("LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
