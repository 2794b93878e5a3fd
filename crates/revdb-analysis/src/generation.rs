//! Text-generation capability: the trait the analyzer calls, a fixed-delay
//! retry loop, and an OpenAI-compatible chat completions client.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use revdb_core::AppConfig;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Produces a completion for a system prompt and a user prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One attempt; retries are applied by the caller.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, GenerationError>;

    /// Model identifier recorded in analysis metadata.
    fn model_name(&self) -> &str;
}

/// Bounded retry with a constant pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.llm_max_retries,
            delay: Duration::from_millis(config.llm_retry_delay_ms),
        }
    }
}

fn is_retriable(err: &GenerationError) -> bool {
    !matches!(
        err,
        GenerationError::MissingApiKey | GenerationError::Exhausted { .. }
    )
}

/// Runs `operation` up to `policy.max_retries + 1` times, sleeping
/// `policy.delay` before every retry.
///
/// # Errors
///
/// Returns a non-retriable error immediately. Otherwise, once every attempt
/// has failed, returns [`GenerationError::Exhausted`] wrapping the last error.
pub async fn run_with_fixed_retry<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) => return Err(err),
            Err(err) => {
                if attempt >= policy.max_retries {
                    return Err(GenerationError::Exhausted {
                        retries: policy.max_retries,
                        last: Box::new(err),
                    });
                }
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "generation attempt failed; retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// Sampling settings for chat completions.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    endpoint: String,
    settings: GenerationSettings,
}

impl OpenAiGenerator {
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingApiKey`] for a blank key, or
    /// [`GenerationError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        settings: GenerationSettings,
    ) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("revdb/0.1 (monthly-review-analysis)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            settings,
        })
    }

    /// Builds the generator from `REVDB_LLM_*` settings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`]; an unset key is [`GenerationError::MissingApiKey`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .llm_api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;
        Self::new(
            api_key,
            &config.llm_base_url,
            GenerationSettings {
                model: config.llm_model.clone(),
                max_tokens: config.llm_max_tokens,
                temperature: config.llm_temperature,
                timeout_secs: config.llm_timeout_secs,
            },
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::UnexpectedStatus {
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|source| GenerationError::Deserialize {
                context: "chat completion".to_owned(),
                source,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyCompletion)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
