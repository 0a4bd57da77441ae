//! Factcheck Pipeline - check the claims in a free-text query.
//!
//! A query is split into claims by an LLM. Each claim is then rewritten into
//! a self-contained assertion, matched to a Wikipedia article via web search,
//! and judged against the article text. The result carries a text-fragment
//! link pointing at the supporting evidence.
//!
//! # Architecture
//!
//! - [`gateway`]: The [`CompletionGateway`] trait and an OpenAI-compatible client
//! - [`search`]: The [`SearchProvider`] trait and Google Custom Search
//! - [`prompt`] and [`parse`]: Prompt templates and defensive response parsing
//! - [`stages`]: One function per pipeline stage
//! - [`orchestrator`]: [`ClaimOrchestrator`], sequential and concurrent processing
//! - [`report`]: Console rendering of results and summaries

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod link;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod report;
pub mod search;
pub mod stages;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use config::FactcheckConfig;
pub use error::{PipelineError, Result};
pub use gateway::{CompletionGateway, LlmConfig, ModelSet, OpenAiClient};
pub use link::build_text_fragment_link;
pub use orchestrator::{ClaimOrchestrator, OrchestratorConfig};
pub use search::{GoogleCustomSearch, SearchProvider};
pub use types::{
    ClaimResult, ClaimStatus, JudgeOutcome, Label, ProcessingMode, RunSummary, Stage,
    StageFailure, StageTimings, Verdict, VerdictSource,
};
