//! Language-model gateway.

mod client;
mod config;

pub use client::{CompletionGateway, OpenAiClient};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::ScriptedGateway;
pub use config::{
    LlmConfig, LlmConfigBuilder, ModelSet, DEFAULT_API_BASE_URL, DEFAULT_ARTICLE_MODEL,
    DEFAULT_EXTRACTION_MODEL, DEFAULT_JUDGE_MODEL, DEFAULT_OPTIMIZATION_MODEL,
};
