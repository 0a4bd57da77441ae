//! Configuration loaded from environment variables.

use crate::error::{PipelineError, Result};
use crate::gateway::{LlmConfig, ModelSet};
use crate::orchestrator::{OrchestratorConfig, DEFAULT_TOP_N};
use crate::prompt::DEFAULT_MAX_CONTEXT_CHARS;

/// Runtime configuration for a fact-checking run.
///
/// NOTE: Debug is implemented by hand so the search key never reaches logs.
#[derive(Clone)]
pub struct FactcheckConfig {
    pub search_api_key: String,
    pub search_engine_id: String,
    pub llm: LlmConfig,
    pub models: ModelSet,
    pub top_n: usize,
    pub max_context_chars: usize,
}

impl std::fmt::Debug for FactcheckConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactcheckConfig")
            .field("search_api_key", &"<redacted>")
            .field("search_engine_id", &self.search_engine_id)
            .field("llm", &self.llm)
            .field("models", &self.models)
            .field("top_n", &self.top_n)
            .field("max_context_chars", &self.max_context_chars)
            .finish()
    }
}

impl FactcheckConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| PipelineError::Config(format!("{key} not set")));

        let search_api_key = require("CUSTOM_SEARCH_API_KEY")?;
        let search_engine_id = require("CUSTOM_SEARCH_ENGINE_ID")?;

        let mut llm = LlmConfig::builder();
        if let Some(base_url) = get("LLM_API_BASE_URL") {
            llm = llm.api_base_url(base_url);
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            llm = llm.api_key(api_key);
        }
        if let Some(temperature) = get("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            llm = llm.temperature(temperature);
        }
        if let Some(max_tokens) = get("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            llm = llm.max_tokens(max_tokens);
        }
        if let Some(timeout_secs) = get("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            llm = llm.timeout_secs(timeout_secs);
        }
        let llm = llm.build();

        // Local OpenAI-compatible servers usually run without a key.
        if llm.is_hosted() && llm.api_key.is_none() {
            return Err(PipelineError::Config("OPENAI_API_KEY not set".into()));
        }

        let models = get("LLM_MODEL")
            .map(ModelSet::uniform)
            .unwrap_or_default();

        let top_n = get("FACTCHECK_TOP_N")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOP_N)
            .max(1);

        let max_context_chars = get("FACTCHECK_MAX_CONTEXT_CHARS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONTEXT_CHARS);

        Ok(Self {
            search_api_key,
            search_engine_id,
            llm,
            models,
            top_n,
            max_context_chars,
        })
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_models(self.models.clone())
            .with_top_n(self.top_n)
            .with_max_context_chars(self.max_context_chars)
    }
}
