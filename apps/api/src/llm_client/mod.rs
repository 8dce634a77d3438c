/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Pipeline stages depend on the `TextGenerator` trait; `LlmClient` is the
/// production implementation.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use prompts::JSON_ONLY_SYSTEM;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The text-generation capability consumed by pipeline stages.
///
/// One call per stage attempt; callers own the fallback policy for failures.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Wire format spoken by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-sonnet-4-5",
            LlmProvider::OpenAi => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Anthropic => f.write_str("anthropic"),
            LlmProvider::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(LlmProvider::Anthropic),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(format!("unknown LLM provider '{other}' (expected anthropic|openai)")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by all pipeline stages.
/// Retries 429 and 5xx responses only when `max_attempts > 1`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: LlmProvider,
    api_key: String,
    model: String,
    temperature: f32,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(
        provider: LlmProvider,
        api_key: String,
        model: Option<String>,
        temperature: f32,
        max_attempts: u32,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            temperature,
            max_attempts: max_attempts.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Makes a call to the configured provider and returns the text of the reply.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(6)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.send(prompt, system).await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            return self.extract_text(&body);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_attempts,
        }))
    }

    async fn send(&self, prompt: &str, system: &str) -> Result<reqwest::Response, reqwest::Error> {
        match self.provider {
            LlmProvider::Anthropic => {
                let body = AnthropicRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature: self.temperature,
                    system,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                };
                self.client
                    .post(ANTHROPIC_API_URL)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
                    .send()
                    .await
            }
            LlmProvider::OpenAi => {
                let body = OpenAiRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature: self.temperature,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: system,
                        },
                        ChatMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                };
                self.client
                    .post(OPENAI_API_URL)
                    .bearer_auth(&self.api_key)
                    .json(&body)
                    .send()
                    .await
            }
        }
    }

    fn extract_text(&self, body: &str) -> Result<String, LlmError> {
        let text = match self.provider {
            LlmProvider::Anthropic => {
                let response: AnthropicResponse = serde_json::from_str(body)?;
                debug!(
                    "LLM call succeeded: input_tokens={}, output_tokens={}",
                    response.usage.input_tokens, response.usage.output_tokens
                );
                response
                    .content
                    .into_iter()
                    .find(|b| b.block_type == "text")
                    .and_then(|b| b.text)
            }
            LlmProvider::OpenAi => {
                let response: OpenAiResponse = serde_json::from_str(body)?;
                if let Some(usage) = &response.usage {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        usage.prompt_tokens, usage.completion_tokens
                    );
                }
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
        };

        match text {
            Some(t) if !t.trim().is_empty() => Ok(t),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(prompt, JSON_ONLY_SYSTEM).await
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
