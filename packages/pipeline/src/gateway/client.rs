//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::gateway::config::LlmConfig;

/// Text-completion capability: a prompt in, the model's raw text out.
///
/// Every LLM call site (claim extraction, optimization, article naming,
/// judging) goes through this trait, which keeps the pipeline testable.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String>;
}

/// Client for OpenAI-compatible `/v1/chat/completions` endpoints.
///
/// Works against the hosted OpenAI API and local servers that mimic it.
///
/// NOTE: Do NOT derive `Debug` on this struct; `api_key` would be exposed.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base_url: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    max_attempts: u32,
    retry_base_delay: Duration,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(PipelineError::LlmApiRequest)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: config.retry_base_delay,
        })
    }
}

#[async_trait]
impl CompletionGateway for OpenAiClient {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_base_url);

        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut last_error: Option<PipelineError> = None;
        let mut next_delay = Duration::ZERO;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                debug!(attempt, model, "retrying LLM request after {:?}", next_delay);
                tokio::time::sleep(next_delay).await;
            }

            // Exponential base delay for the next potential retry: 1x, 2x, 4x, ...
            next_delay = self.retry_base_delay * (1 << attempt.min(16));

            let mut request = self.http.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let resp = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, model, error = %e, "LLM request failed");
                    last_error = Some(PipelineError::LlmApiRequest(e));
                    continue;
                }
            };

            let status = resp.status().as_u16();

            if status == 429 {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(attempt, model, retry_after, "LLM rate limited");
                next_delay = Duration::from_secs(retry_after).max(next_delay);
                last_error = Some(PipelineError::LlmRateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status >= 500 {
                let body_text = resp.text().await.unwrap_or_default();
                warn!(attempt, model, status, body = %body_text, "LLM server error");
                last_error = Some(PipelineError::LlmApiError {
                    status,
                    message: body_text,
                });
                continue;
            }

            if status != 200 {
                let body_text = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body_text)
                    .ok()
                    .and_then(|r| r.error)
                    .map(|e| e.message)
                    .unwrap_or(body_text);
                return Err(PipelineError::LlmApiError { status, message });
            }

            let api_response: ChatResponse = resp
                .json()
                .await
                .map_err(|e| PipelineError::LlmResponseParse(e.to_string()))?;

            let content = api_response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default();

            if content.trim().is_empty() {
                warn!(attempt, model, "LLM returned empty response");
                last_error = Some(PipelineError::LlmEmptyResponse);
                continue;
            }

            return Ok(content);
        }

        Err(last_error.unwrap_or(PipelineError::LlmEmptyResponse))
    }
}

/// Test utilities for the completion gateway.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Scripted gateway for tests.
    ///
    /// Answers with the first rule whose needle occurs in the prompt. A rule
    /// without a reply simulates an API failure. Prompts that match no rule
    /// get [`PipelineError::LlmEmptyResponse`].
    #[derive(Default)]
    pub struct ScriptedGateway {
        rules: Vec<(String, Option<String>)>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reply with `reply` to prompts containing `needle`.
        pub fn on(mut self, needle: &str, reply: &str) -> Self {
            self.rules.push((needle.to_string(), Some(reply.to_string())));
            self
        }

        /// Fail prompts containing `needle`.
        pub fn fail_on(mut self, needle: &str) -> Self {
            self.rules.push((needle.to_string(), None));
            self
        }

        /// Every `(prompt, model)` pair seen so far.
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(&self, prompt: &str, model: &str) -> Result<String> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((prompt.to_string(), model.to_string()));
            }

            match self.rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
                Some((_, Some(reply))) => Ok(reply.clone()),
                Some((needle, None)) => Err(PipelineError::LlmApiError {
                    status: 503,
                    message: format!("scripted failure for '{needle}'"),
                }),
                None => Err(PipelineError::LlmEmptyResponse),
            }
        }
    }
}
