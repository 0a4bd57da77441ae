//! LLM connection settings and per-stage model names.

use std::time::Duration;

/// Default base URL for the hosted OpenAI API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com";

/// Model used for claim extraction.
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-5-nano";

/// Model used for rewriting claims into self-contained assertions.
pub const DEFAULT_OPTIMIZATION_MODEL: &str = "gpt-5-mini";

/// Model used for naming the target article.
pub const DEFAULT_ARTICLE_MODEL: &str = "gpt-5-nano";

/// Model used for judging a claim against article text.
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-5-nano";

/// Connection settings for an OpenAI-compatible completion endpoint.
///
/// NOTE: Do NOT derive `Debug` on structs holding `api_key` without redacting it.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

impl LlmConfig {
    /// Whether the endpoint is the hosted OpenAI API (which needs a key).
    pub fn is_hosted(&self) -> bool {
        self.api_base_url.trim_end_matches('/') == DEFAULT_API_BASE_URL
    }

    /// Create a config builder.
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
            max_attempts: 4,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Builder for constructing `LlmConfig`.
pub struct LlmConfigBuilder {
    api_key: Option<String>,
    api_base_url: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    timeout_secs: u64,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl LlmConfigBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn build(self) -> LlmConfig {
        LlmConfig {
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
            max_attempts: self.max_attempts,
            retry_base_delay: self.retry_base_delay,
        }
    }
}

/// Model identifier used at each gateway call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    pub extraction: String,
    pub optimization: String,
    pub article: String,
    pub judge: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            extraction: DEFAULT_EXTRACTION_MODEL.into(),
            optimization: DEFAULT_OPTIMIZATION_MODEL.into(),
            article: DEFAULT_ARTICLE_MODEL.into(),
            judge: DEFAULT_JUDGE_MODEL.into(),
        }
    }
}

impl ModelSet {
    /// Use the same model for every call site (e.g. a single local model).
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            extraction: model.clone(),
            optimization: model.clone(),
            article: model.clone(),
            judge: model,
        }
    }
}
