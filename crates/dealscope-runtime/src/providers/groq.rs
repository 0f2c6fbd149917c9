//! Groq provider (OpenAI-compatible chat completions API).
//!
//! One awaited round trip per request, fixed timeout, no retry. A
//! failed enrichment call is handled by the auditor's fallback, not by
//! hammering the API again.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    TokenUsage,
};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct GroqProvider {
    client: reqwest::Client,
    credential: ApiCredential,
    api_url: String,
}

#[derive(Deserialize)]
struct ChatCompletionBody {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
    model: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl GroqProvider {
    pub fn new(credential: ApiCredential) -> Self {
        Self {
            client: reqwest::Client::new(),
            credential,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (tests, proxies).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Load the credential from `GROQ_API_KEY`.
    pub fn from_env() -> Result<Self, ProviderError> {
        Ok(Self::new(ApiCredential::from_env(
            "GROQ_API_KEY",
            "Groq API key",
        )?))
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut body = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "seed": config.seed,
        });
        if config.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        debug!(model = %config.model, timeout = ?config.timeout, "sending chat completion");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.credential.expose())
            .timeout(config.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(err.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs);
            warn!(?retry_after, "rate limited by upstream");
            return Err(ProviderError::RateLimited { retry_after });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthError);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionBody = response
            .json()
            .await
            .map_err(|err| ProviderError::ParseError(err.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".into()))?;

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: parsed.model,
            stop_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "groq"
    }
}
