//! The individual pipeline stages.
//!
//! Each stage is a plain request/response function over injected
//! collaborators. Stages return errors; deciding what a failure means for
//! the claim is up to the orchestrator.

use std::sync::Arc;

use factcheck_retriever::{PageRetriever, Retrieved};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::gateway::CompletionGateway;
use crate::parse::{parse_claims, parse_judge};
use crate::prompt::{
    build_article_prompt, build_extract_claims_prompt, build_judge_prompt, build_optimize_prompt,
    select_relevant_content,
};
use crate::search::SearchProvider;
use crate::types::JudgeOutcome;

/// Upper bound on concurrent retrievals for one claim.
pub const MAX_RETRIEVAL_WORKERS: usize = 3;

/// Extract fact-checkable claims from a free-text query.
///
/// A blank query has no claims and is not sent to the gateway.
pub async fn extract_claims(
    gateway: &dyn CompletionGateway,
    query: &str,
    model: &str,
) -> Result<Vec<String>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let response = gateway
        .complete(&build_extract_claims_prompt(query), model)
        .await?;
    let claims = parse_claims(&response);
    info!(count = claims.len(), "extracted claims");
    Ok(claims)
}

/// Rewrite a claim into a self-contained assertion.
pub async fn optimize_claim(
    gateway: &dyn CompletionGateway,
    claim: &str,
    model: &str,
) -> Result<String> {
    let response = gateway.complete(&build_optimize_prompt(claim), model).await?;
    let optimized = response.trim();
    if optimized.is_empty() {
        return Err(PipelineError::LlmEmptyResponse);
    }
    Ok(optimized.to_string())
}

/// Ask which reference article would settle the claim.
pub async fn article_query(
    gateway: &dyn CompletionGateway,
    claim: &str,
    model: &str,
) -> Result<String> {
    let response = gateway.complete(&build_article_prompt(claim), model).await?;
    Ok(response.trim().to_string())
}

/// Search for up to `limit` source URLs.
///
/// A blank query finds nothing without contacting the provider.
pub async fn find_sources(
    search: &dyn SearchProvider,
    query: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut urls = search.search(query, limit).await?;
    urls.truncate(limit);
    Ok(urls)
}

/// Retrieve page content for the first URL that yields any.
///
/// With `concurrent` set, all URLs are fetched at once (at most
/// [`MAX_RETRIEVAL_WORKERS`] in flight) and the first success by completion
/// order wins. Fetches still running at that point are detached, not
/// aborted. Otherwise only the first URL is tried.
pub async fn retrieve_content(
    retriever: Arc<dyn PageRetriever>,
    urls: &[String],
    concurrent: bool,
) -> Result<Retrieved> {
    let Some(first) = urls.first() else {
        return Err(PipelineError::InvalidInput("no URLs to retrieve".into()));
    };

    if !concurrent || urls.len() == 1 {
        return Ok(retriever.retrieve(first).await?);
    }

    let permits = Arc::new(Semaphore::new(urls.len().min(MAX_RETRIEVAL_WORKERS)));
    let mut tasks = FuturesUnordered::new();

    for url in urls {
        let retriever = Arc::clone(&retriever);
        let permits = Arc::clone(&permits);
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Worker(e.to_string()))?;
            retriever.retrieve(&url).await.map_err(PipelineError::from)
        }));
    }

    let mut last_error = None;
    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(Ok(retrieved)) => {
                debug!(url = %retrieved.url, pending = tasks.len(), "first retrieval succeeded");
                return Ok(retrieved);
            }
            Ok(Err(e)) => {
                debug!(error = %e, "retrieval failed");
                last_error = Some(e);
            }
            Err(e) => {
                warn!(error = %e, "retrieval task died");
                last_error = Some(PipelineError::Worker(e.to_string()));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| PipelineError::InvalidInput("no URLs to retrieve".into())))
}

/// Judge a claim against page content.
///
/// Content over `max_context_chars` is reduced to the most relevant
/// paragraphs first.
pub async fn judge_claim(
    gateway: &dyn CompletionGateway,
    claim: &str,
    content: &str,
    model: &str,
    max_context_chars: usize,
) -> Result<JudgeOutcome> {
    let context = select_relevant_content(claim, content, max_context_chars);
    let response = gateway
        .complete(&build_judge_prompt(claim, &context), model)
        .await?;
    Ok(parse_judge(&response))
}
