//! Error types for the pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[source] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("search request failed: {0}")]
    SearchRequest(#[source] reqwest::Error),

    #[error("search API error (status {status}): {message}")]
    SearchApiError { status: u16, message: String },

    #[error("failed to parse search response: {0}")]
    SearchResponseParse(String),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] factcheck_retriever::RetrieverError),

    #[error("claim worker failed: {0}")]
    Worker(String),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
