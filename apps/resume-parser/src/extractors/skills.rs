use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use super::prompts::{skills_user_prompt, SKILLS_SYSTEM_PROMPT};
use super::{ensure_text, leading_chars, FieldExtractor};
use crate::config::Config;
use crate::errors::ParserError;
use crate::llm_client::retry::{retry_with_backoff, RetryPolicy};
use crate::llm_client::{ChatBackend, LlmClient, LlmError};

/// Resume text beyond this many characters is not sent to the model.
pub const MAX_TEXT_CHARS: usize = 15_000;

/// LLM-backed skills strategy.
///
/// Only the network call is retried. A response that arrives but cannot be
/// parsed is fatal on the first attempt.
pub struct SkillsExtractor {
    backend: Arc<dyn ChatBackend>,
    max_skills: usize,
    retry: RetryPolicy,
}

impl SkillsExtractor {
    pub fn new(backend: Arc<dyn ChatBackend>, max_skills: usize) -> Self {
        Self {
            backend,
            max_skills,
            retry: RetryPolicy::default(),
        }
    }

    /// Builds the HTTP client from config. A missing API key is reported as
    /// `DependencyUnavailable` so the coordinator can refuse to start.
    pub fn from_config(config: &Config) -> Result<Self, ParserError> {
        let client = LlmClient::new(config).map_err(|e| {
            ParserError::DependencyUnavailable(format!("LLM client initialization failed: {e}"))
        })?;
        info!("Initialized SkillsExtractor with model: {}", client.model());
        Ok(Self::new(Arc::new(client), config.max_skills_returned))
    }

    async fn request(&self, text: &str) -> Result<Vec<String>, ParserError> {
        ensure_text(text)?;

        let truncated = leading_chars(text, MAX_TEXT_CHARS);
        if truncated.len() < text.len() {
            debug!(
                "Truncated resume text from {} to {} characters",
                text.chars().count(),
                MAX_TEXT_CHARS
            );
        }

        info!("Extracting skills using {}", self.backend.model());
        let user = skills_user_prompt(truncated);

        let completion = retry_with_backoff(&self.retry, LlmError::is_retryable, || {
            self.backend.complete_json(SKILLS_SYSTEM_PROMPT, &user)
        })
        .await
        .map_err(|e| {
            error!("Skills extraction request failed: {}", e);
            backend_error(e)
        })?;

        info!(
            model = %self.backend.model(),
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            total_tokens = completion.usage.total_tokens,
            "Token usage"
        );
        debug!("Skills response: {}", completion.content);

        let skills = parse_skills(&completion.content, self.max_skills)?;
        info!("Successfully extracted {} skills", skills.len());
        Ok(skills)
    }
}

fn backend_error(e: LlmError) -> ParserError {
    match e {
        LlmError::Parse(err) => ParserError::MalformedResponse(err.to_string()),
        e if e.is_retryable() => ParserError::TransientBackend(e.to_string()),
        e => ParserError::Backend(e.to_string()),
    }
}

/// Parses `{"skills": [...]}` strictly. A missing `skills` key yields an empty
/// list; any other shape is `MalformedResponse`. Non-string and blank entries
/// are dropped, case-insensitive duplicates collapse to the first occurrence,
/// and the result is capped at `max_skills`.
pub fn parse_skills(content: &str, max_skills: usize) -> Result<Vec<String>, ParserError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ParserError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    let object = value.as_object().ok_or_else(|| {
        ParserError::MalformedResponse("response is not a JSON object".to_string())
    })?;

    let entries = match object.get("skills") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ParserError::MalformedResponse(
                "\"skills\" is not an array".to_string(),
            ))
        }
    };

    let mut seen = HashSet::new();
    Ok(entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(max_skills)
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl FieldExtractor for SkillsExtractor {
    type Output = Vec<String>;

    fn field(&self) -> &'static str {
        "skills"
    }

    async fn extract(&self, text: &str) -> Result<Vec<String>, ParserError> {
        self.request(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{Completion, TokenUsage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays scripted responses and records every user prompt.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete_json(&self, _system: &str, user: &str) -> Result<Completion, LlmError> {
            self.prompts.lock().unwrap().push(user.to_string());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent));
            next.map(|content| Completion {
                content,
                usage: TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    total_tokens: 120,
                },
            })
        }
    }

    fn rate_limited() -> LlmError {
        LlmError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        }
    }

    #[test]
    fn test_parse_filters_and_dedups() {
        let content = r#"{"skills": ["Python", "python", "  AWS  ", 42, "Docker", "Python", ""]}"#;
        assert_eq!(
            parse_skills(content, 20).unwrap(),
            vec!["Python", "AWS", "Docker"]
        );
    }

    #[test]
    fn test_parse_caps_result() {
        let content = r#"{"skills": ["A1", "B2", "C3", "D4"]}"#;
        assert_eq!(parse_skills(content, 2).unwrap(), vec!["A1", "B2"]);
    }

    #[test]
    fn test_parse_missing_key_is_empty() {
        assert!(parse_skills(r#"{"other": 1}"#, 20).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for content in ["not json", r#"["Python"]"#, r#"{"skills": "Python"}"#] {
            assert!(
                matches!(
                    parse_skills(content, 20),
                    Err(ParserError::MalformedResponse(_))
                ),
                "accepted {content}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let backend = ScriptedBackend::new(vec![
            Err(rate_limited()),
            Ok(r#"{"skills": ["Rust", "Kubernetes"]}"#.to_string()),
        ]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let skills = extractor.extract("Rust and Kubernetes in production").await.unwrap();
        assert_eq!(skills, vec!["Rust", "Kubernetes"]);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_three_attempts() {
        let backend = ScriptedBackend::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
            Ok(r#"{"skills": ["never reached"]}"#.to_string()),
        ]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let err = extractor.extract("some resume").await.unwrap_err();
        assert!(matches!(err, ParserError::TransientBackend(_)));
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_backend_error_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(LlmError::Api {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        })]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let err = extractor.extract("some resume").await.unwrap_err();
        assert!(matches!(err, ParserError::Backend(_)));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_response_not_retried() {
        let backend = ScriptedBackend::new(vec![
            Ok("definitely not json".to_string()),
            Ok(r#"{"skills": ["Go"]}"#.to_string()),
        ]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let err = extractor.extract("some resume").await.unwrap_err();
        assert!(matches!(err, ParserError::MalformedResponse(_)));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_input_truncated_before_sending() {
        let backend = ScriptedBackend::new(vec![Ok(r#"{"skills": []}"#.to_string())]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let long_text = "é".repeat(MAX_TEXT_CHARS + 5_000);
        extractor.extract(&long_text).await.unwrap();

        let prompts = backend.prompts.lock().unwrap();
        let sent = prompts[0].matches('é').count();
        assert_eq!(sent, MAX_TEXT_CHARS);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_calling_backend() {
        let backend = ScriptedBackend::new(vec![]);
        let extractor = SkillsExtractor::new(backend.clone(), 20);

        let err = extractor.extract("  \n ").await.unwrap_err();
        assert!(matches!(err, ParserError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_from_config_without_key_is_dependency_unavailable() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(matches!(
            SkillsExtractor::from_config(&config),
            Err(ParserError::DependencyUnavailable(_))
        ));
    }
}
