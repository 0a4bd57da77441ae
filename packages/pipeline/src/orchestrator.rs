//! Per-claim pipeline orchestration.
//!
//! Runs each claim through optimize, article query, search, retrieval and
//! judging, timing every stage, and schedules claims sequentially or on a
//! bounded worker pool.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use factcheck_retriever::PageRetriever;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::gateway::{CompletionGateway, ModelSet};
use crate::link::build_text_fragment_link;
use crate::prompt::DEFAULT_MAX_CONTEXT_CHARS;
use crate::search::SearchProvider;
use crate::stages;
use crate::types::{
    aggregate_timings, ClaimResult, ClaimStatus, JudgeOutcome, ProcessingMode, RunSummary, Stage,
};

/// Default number of search results to consider per claim.
pub const DEFAULT_TOP_N: usize = 1;

/// Upper bound on claims processed at once in concurrent mode.
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Tuning knobs for [`ClaimOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub models: ModelSet,
    /// Search results to request per claim.
    pub top_n: usize,
    /// Page text handed to the judge, in characters.
    pub max_context_chars: usize,
    /// Claim worker pool width in concurrent mode.
    pub max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            models: ModelSet::default(),
            top_n: DEFAULT_TOP_N,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_models(mut self, models: ModelSet) -> Self {
        self.models = models;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }
}

/// Drives claims through optimize, article query, search, retrieve, judge
/// and link building.
///
/// Collaborator failures never escape a stage: they are recorded on the
/// claim's [`ClaimResult`] and the claim either continues with a fallback or
/// stops with a terminal status.
#[derive(Clone)]
pub struct ClaimOrchestrator {
    gateway: Arc<dyn CompletionGateway>,
    search: Arc<dyn SearchProvider>,
    retriever: Arc<dyn PageRetriever>,
    config: Arc<OrchestratorConfig>,
}

async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let output = fut.await;
    (output, start.elapsed())
}

impl ClaimOrchestrator {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        search: Arc<dyn SearchProvider>,
        retriever: Arc<dyn PageRetriever>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            search,
            retriever,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process one claim, retrieving only the first search result.
    pub async fn process(&self, claim: &str) -> ClaimResult {
        self.process_with_mode(claim, ProcessingMode::Sequential).await
    }

    /// Process one claim. In concurrent mode all search results are
    /// retrieved at once and the first page to arrive is judged.
    pub async fn process_with_mode(&self, claim: &str, mode: ProcessingMode) -> ClaimResult {
        let concurrent = mode == ProcessingMode::Concurrent;
        let started = Instant::now();
        let models = &self.config.models;
        let mut result = ClaimResult::new(claim);

        info!(claim, %mode, "evaluating claim");

        let (optimized, elapsed) = timed(stages::optimize_claim(
            self.gateway.as_ref(),
            claim,
            &models.optimization,
        ))
        .await;
        result.timings.record(Stage::Optimize, elapsed);
        result.optimized = match optimized {
            Ok(optimized) => optimized,
            Err(e) => {
                warn!(claim, error = %e, "claim optimization failed, using original claim");
                result.record_failure(Stage::Optimize, e.to_string());
                claim.to_string()
            }
        };

        // The article query is derived from the original claim, not the
        // optimized one.
        let (article, elapsed) = timed(stages::article_query(
            self.gateway.as_ref(),
            claim,
            &models.article,
        ))
        .await;
        result.timings.record(Stage::ArticleQuery, elapsed);
        result.article_query = match article {
            Ok(article) => article,
            Err(e) => {
                warn!(claim, error = %e, "article query failed");
                result.record_failure(Stage::ArticleQuery, e.to_string());
                String::new()
            }
        };

        let (urls, elapsed) = timed(stages::find_sources(
            self.search.as_ref(),
            &result.article_query,
            self.config.top_n,
        ))
        .await;
        result.timings.record(Stage::Search, elapsed);
        match urls {
            Ok(urls) if !urls.is_empty() => result.urls = urls,
            Ok(_) => {
                info!(claim, query = %result.article_query, "no URL found");
                result.status = ClaimStatus::NoUrlFound;
                return finish(result, started);
            }
            Err(e) => {
                warn!(claim, error = %e, "search failed");
                result.record_failure(Stage::Search, e.to_string());
                result.status = ClaimStatus::NoUrlFound;
                return finish(result, started);
            }
        }

        let (page, elapsed) = timed(stages::retrieve_content(
            Arc::clone(&self.retriever),
            &result.urls,
            concurrent,
        ))
        .await;
        result.timings.record(Stage::Retrieve, elapsed);
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                warn!(claim, error = %e, "failed to retrieve content from any URL");
                result.record_failure(Stage::Retrieve, e.to_string());
                result.status = ClaimStatus::ScrapeFailed;
                return finish(result, started);
            }
        };
        result.source_url = Some(page.url.clone());
        result.source_tier = Some(page.tier.to_string());

        let (outcome, elapsed) = timed(stages::judge_claim(
            self.gateway.as_ref(),
            claim,
            &page.text,
            &models.judge,
            self.config.max_context_chars,
        ))
        .await;
        result.timings.record(Stage::Judge, elapsed);
        match outcome {
            Ok(JudgeOutcome::Unparseable) => {
                warn!(claim, "judge response could not be parsed");
                result.record_failure(Stage::Judge, "unparseable judge response");
            }
            Ok(outcome) => {
                if matches!(outcome, JudgeOutcome::Heuristic(_)) {
                    warn!(claim, "judge response was not valid JSON, verdict guessed from text");
                }
                result.verdict = outcome.into_verdict();
            }
            Err(e) => {
                warn!(claim, error = %e, "fact-check failed");
                result.record_failure(Stage::Judge, e.to_string());
            }
        }

        let evidence = result.verdict.as_ref().map(|v| v.evidence.as_str());
        result.link = Some(build_text_fragment_link(&page.url, evidence));

        finish(result, started)
    }

    /// Process many claims.
    ///
    /// Sequential mode keeps input order. Concurrent mode runs at most
    /// `max_workers` claims at once and returns results in completion order.
    /// A claim whose worker dies yields a [`ClaimStatus::Failed`] result.
    pub async fn process_all(&self, claims: &[String], mode: ProcessingMode) -> Vec<ClaimResult> {
        match mode {
            ProcessingMode::Sequential => {
                let mut results = Vec::with_capacity(claims.len());
                for claim in claims {
                    results.push(self.spawn_claim(claim, mode, None).await);
                }
                results
            }
            ProcessingMode::Concurrent => {
                let width = claims.len().min(self.config.max_workers).max(1);
                let permits = Arc::new(Semaphore::new(width));
                info!(claims = claims.len(), width, "processing claims concurrently");

                claims
                    .iter()
                    .map(|claim| self.spawn_claim(claim, mode, Some(Arc::clone(&permits))))
                    .collect::<FuturesUnordered<_>>()
                    .collect()
                    .await
            }
        }
    }

    /// Run a claim on its own task, turning a panic into a failed result.
    fn spawn_claim(
        &self,
        claim: &str,
        mode: ProcessingMode,
        permits: Option<Arc<Semaphore>>,
    ) -> impl Future<Output = ClaimResult> {
        let worker = self.clone();
        let task_claim = claim.to_string();
        let handle = tokio::spawn(async move {
            let _permit = match permits {
                Some(permits) => match permits.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => return ClaimResult::failed(task_claim, e.to_string()),
                },
                None => None,
            };
            worker.process_with_mode(&task_claim, mode).await
        });

        let claim = claim.to_string();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(claim = %claim, error = %e, "claim worker failed");
                    ClaimResult::failed(claim, e.to_string())
                }
            }
        }
    }

    /// Extract claims from `query` and process them all.
    ///
    /// A failed extraction call is recorded on the summary and leaves the
    /// run without claims; per-claim problems are reported in the results.
    pub async fn run(&self, query: &str, mode: ProcessingMode) -> RunSummary {
        let started = Instant::now();
        info!(query, %mode, "processing query");

        let (claims, extraction_time) = timed(stages::extract_claims(
            self.gateway.as_ref(),
            query,
            &self.config.models.extraction,
        ))
        .await;
        let (claims, extraction_failure) = match claims {
            Ok(claims) => (claims, None),
            Err(e) => {
                warn!(error = %e, "claim extraction failed, continuing without claims");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let results = if claims.is_empty() {
            info!("no claims found to process");
            Vec::new()
        } else {
            self.process_all(&claims, mode).await
        };
        let stage_totals = aggregate_timings(&results);

        RunSummary {
            mode,
            query: query.to_string(),
            claims,
            extraction_time,
            extraction_failure,
            total_time: started.elapsed(),
            results,
            stage_totals,
        }
    }
}

fn finish(mut result: ClaimResult, started: Instant) -> ClaimResult {
    result.total = started.elapsed();
    info!(
        claim = %result.claim,
        status = %result.status,
        total_ms = result.total.as_millis() as u64,
        "claim finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use crate::test_support::{StaticRetriever, StaticSearch};
    use crate::types::{Label, VerdictSource};
    use pretty_assertions::assert_eq;

    const ADA_URL: &str = "https://en.wikipedia.org/wiki/Ada_Lovelace";
    const ADA_TEXT: &str = "Augusta Ada King, Countess of Lovelace, was an English mathematician.\n\n\
                            She was born on 10 December 1815 in London.";

    fn orchestrator(
        gateway: ScriptedGateway,
        search: StaticSearch,
        retriever: StaticRetriever,
        config: OrchestratorConfig,
    ) -> ClaimOrchestrator {
        ClaimOrchestrator::new(
            Arc::new(gateway),
            Arc::new(search),
            Arc::new(retriever),
            config,
        )
    }

    fn ada_gateway() -> ScriptedGateway {
        ScriptedGateway::new()
            .on("Strictly extract", r#"["Ada Lovelace was born in 1815."]"#)
            .on("Scraped Content", r#"{"label":"True","evidence":"born on 10 December 1815"}"#)
            .on("Rewrite", "Ada Lovelace was born in 1815.")
            .on("name of the wikipedia article", "Ada Lovelace")
    }

    #[tokio::test]
    async fn test_ada_lovelace_end_to_end() {
        let orchestrator = orchestrator(
            ada_gateway(),
            StaticSearch::new().with("Ada Lovelace", &[ADA_URL]),
            StaticRetriever::new().with(ADA_URL, ADA_TEXT),
            OrchestratorConfig::default(),
        );

        let summary = orchestrator
            .run("Ada Lovelace was born in 1815.", ProcessingMode::Concurrent)
            .await;

        assert_eq!(summary.claims, vec!["Ada Lovelace was born in 1815."]);
        assert_eq!(summary.results.len(), 1);

        let result = &summary.results[0];
        assert_eq!(result.status, ClaimStatus::Completed);
        assert_eq!(result.article_query, "Ada Lovelace");
        assert_eq!(result.urls, vec![ADA_URL]);
        assert_eq!(result.source_url.as_deref(), Some(ADA_URL));
        let verdict = result.verdict.as_ref().unwrap();
        assert_eq!(verdict.label, Label::True);
        assert_eq!(verdict.source, VerdictSource::Parsed);
        assert_eq!(
            result.link.as_deref(),
            Some("https://en.wikipedia.org/wiki/Ada_Lovelace#:~:text=born%20on%2010%20December%201815")
        );
        assert!(result.failures.is_empty());
        assert!(summary.average_claim_time().is_some());
    }

    #[tokio::test]
    async fn test_article_query_uses_original_claim() {
        let gateway = Arc::new(ada_gateway());
        let orchestrator = ClaimOrchestrator::new(
            gateway.clone(),
            Arc::new(StaticSearch::new().with("Ada Lovelace", &[ADA_URL])),
            Arc::new(StaticRetriever::new().with(ADA_URL, ADA_TEXT)),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("she was born in 1815").await;
        assert_eq!(result.optimized, "Ada Lovelace was born in 1815.");
        assert_eq!(result.status, ClaimStatus::Completed);

        let calls = gateway.calls();
        assert!(calls
            .iter()
            .any(|(prompt, _)| prompt.ends_with("the claim \"she was born in 1815\"")));
        // Judged against the original wording too.
        assert!(calls
            .iter()
            .any(|(prompt, _)| prompt.contains("Claim: \"she was born in 1815\"")));
    }

    #[tokio::test]
    async fn test_optimize_failure_falls_back_to_claim() {
        let gateway = ScriptedGateway::new()
            .fail_on("Rewrite")
            .on("Scraped Content", r#"{"label":"False","evidence":"born on 10 December 1815"}"#)
            .on("name of the wikipedia article", "Ada Lovelace");
        let orchestrator = orchestrator(
            gateway,
            StaticSearch::new().with("Ada Lovelace", &[ADA_URL]),
            StaticRetriever::new().with(ADA_URL, ADA_TEXT),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("Ada Lovelace was born in 1816").await;
        assert_eq!(result.optimized, "Ada Lovelace was born in 1816");
        assert_eq!(result.status, ClaimStatus::Completed);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].stage, Stage::Optimize);
        assert_eq!(result.verdict.unwrap().label, Label::False);
    }

    #[tokio::test]
    async fn test_article_failure_means_no_url() {
        let gateway = ScriptedGateway::new()
            .on("Rewrite", "x")
            .fail_on("name of the wikipedia article");
        let search = Arc::new(StaticSearch::new());
        let orchestrator = ClaimOrchestrator::new(
            Arc::new(gateway),
            search.clone(),
            Arc::new(StaticRetriever::new()),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("Some claim").await;
        assert_eq!(result.article_query, "");
        assert_eq!(result.status, ClaimStatus::NoUrlFound);
        assert_eq!(result.failures[0].stage, Stage::ArticleQuery);
        assert!(search.queries().is_empty());
        assert!(result.link.is_none());
    }

    #[tokio::test]
    async fn test_search_failure_is_terminal() {
        let orchestrator = orchestrator(
            ada_gateway(),
            StaticSearch::new().fail_on("Ada Lovelace"),
            StaticRetriever::new(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("Ada Lovelace was born in 1815.").await;
        assert_eq!(result.status, ClaimStatus::NoUrlFound);
        assert_eq!(result.failures[0].stage, Stage::Search);
        assert!(result.verdict.is_none());
        assert_eq!(result.timings.judge, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_terminal() {
        let orchestrator = orchestrator(
            ada_gateway(),
            StaticSearch::new().with("Ada Lovelace", &[ADA_URL]),
            StaticRetriever::new(),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("Ada Lovelace was born in 1815.").await;
        assert_eq!(result.status, ClaimStatus::ScrapeFailed);
        assert!(result.source_url.is_none());
        assert!(result.link.is_none());
    }

    #[tokio::test]
    async fn test_judge_failure_still_links_source() {
        let gateway = ScriptedGateway::new()
            .fail_on("Scraped Content")
            .on("Rewrite", "x")
            .on("name of the wikipedia article", "Ada Lovelace");
        let orchestrator = orchestrator(
            gateway,
            StaticSearch::new().with("Ada Lovelace", &[ADA_URL]),
            StaticRetriever::new().with(ADA_URL, ADA_TEXT),
            OrchestratorConfig::default(),
        );

        let result = orchestrator.process("Ada Lovelace was born in 1815.").await;
        assert_eq!(result.status, ClaimStatus::Completed);
        assert!(result.verdict.is_none());
        assert_eq!(result.link.as_deref(), Some(ADA_URL));
        assert_eq!(result.failures[0].stage, Stage::Judge);
    }

    #[tokio::test]
    async fn test_concurrent_retrieval_takes_first_to_complete() {
        let slow = "https://en.wikipedia.org/wiki/Slow";
        let fast = "https://en.wikipedia.org/wiki/Fast";
        let orchestrator = orchestrator(
            ada_gateway(),
            StaticSearch::new().with("Ada Lovelace", &[slow, fast]),
            StaticRetriever::new()
                .with_delay(slow, ADA_TEXT, Duration::from_millis(300))
                .with(fast, ADA_TEXT),
            OrchestratorConfig::default().with_top_n(2),
        );

        let concurrent = orchestrator
            .process_with_mode("Ada Lovelace was born in 1815.", ProcessingMode::Concurrent)
            .await;
        assert_eq!(concurrent.source_url.as_deref(), Some(fast));

        let sequential = orchestrator.process("Ada Lovelace was born in 1815.").await;
        assert_eq!(sequential.source_url.as_deref(), Some(slow));
    }

    fn multi_claim_orchestrator() -> (ClaimOrchestrator, Vec<String>) {
        let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
        let claims: Vec<String> = names.iter().map(|n| format!("{n} fact")).collect();
        let extraction = serde_json::to_string(&claims).unwrap();

        let mut gateway = ScriptedGateway::new()
            .on("Strictly extract", &extraction)
            .on("Scraped Content", r#"{"label":"True","evidence":"fact text"}"#)
            .on("Rewrite", "rewritten");
        let mut search = StaticSearch::new();
        let mut retriever = StaticRetriever::new();

        for name in names {
            let url = format!("https://en.wikipedia.org/wiki/{name}");
            gateway = gateway.on(&format!("the claim \"{name} fact\""), name);
            search = search.with(name, &[url.as_str()]);
            retriever = retriever.with(&url, "Some fact text about it.");
        }
        // Bravo's search collaborator fails.
        search = search.fail_on("Bravo");

        let orchestrator = ClaimOrchestrator::new(
            Arc::new(gateway),
            Arc::new(search),
            Arc::new(retriever),
            OrchestratorConfig::default(),
        );
        (orchestrator, claims)
    }

    type Outcome = (String, String, Vec<String>, Option<String>, ClaimStatus, Option<String>);

    fn outcomes(results: &[ClaimResult]) -> Vec<Outcome> {
        let mut outcomes: Vec<Outcome> = results
            .iter()
            .map(|r| {
                (
                    r.claim.clone(),
                    r.article_query.clone(),
                    r.urls.clone(),
                    r.source_url.clone(),
                    r.status.clone(),
                    r.link.clone(),
                )
            })
            .collect();
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        outcomes
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let (orchestrator, claims) = multi_claim_orchestrator();

        let sequential = orchestrator
            .process_all(&claims, ProcessingMode::Sequential)
            .await;
        let concurrent = orchestrator
            .process_all(&claims, ProcessingMode::Concurrent)
            .await;

        assert_eq!(sequential.len(), claims.len());
        assert_eq!(concurrent.len(), claims.len());
        assert_eq!(outcomes(&sequential), outcomes(&concurrent));

        // Sequential keeps input order.
        let order: Vec<&str> = sequential.iter().map(|r| r.claim.as_str()).collect();
        assert_eq!(order, claims.iter().map(String::as_str).collect::<Vec<_>>());

        // The failing claim is marked, the others are unaffected.
        for result in &concurrent {
            if result.claim == "Bravo fact" {
                assert_eq!(result.status, ClaimStatus::NoUrlFound);
                assert_eq!(result.failures[0].stage, Stage::Search);
            } else {
                assert_eq!(result.status, ClaimStatus::Completed, "{}", result.claim);
                assert!(result.verdict.is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_panicking_claim_does_not_abort_batch() {
        let bad = "https://en.wikipedia.org/wiki/Bad";
        let gateway = ScriptedGateway::new()
            .on("Scraped Content", r#"{"label":"True","evidence":"fine"}"#)
            .on("Rewrite", "rewritten")
            .on("the claim \"Bad fact\"", "Bad")
            .on("name of the wikipedia article", "Ada Lovelace");
        let orchestrator = orchestrator(
            gateway,
            StaticSearch::new()
                .with("Bad", &[bad])
                .with("Ada Lovelace", &[ADA_URL]),
            StaticRetriever::new().panic_on(bad).with(ADA_URL, ADA_TEXT),
            OrchestratorConfig::default(),
        );
        let claims = vec!["Bad fact".to_string(), "Good fact".to_string()];

        for mode in [ProcessingMode::Concurrent, ProcessingMode::Sequential] {
            let results = orchestrator.process_all(&claims, mode).await;
            assert_eq!(results.len(), 2);

            let bad_result = results.iter().find(|r| r.claim == "Bad fact").unwrap();
            assert!(matches!(bad_result.status, ClaimStatus::Failed(_)));
            let good_result = results.iter().find(|r| r.claim == "Good fact").unwrap();
            assert_eq!(good_result.status, ClaimStatus::Completed);
        }
    }

    #[tokio::test]
    async fn test_run_aggregates_stage_totals() {
        let (orchestrator, claims) = multi_claim_orchestrator();

        let summary = orchestrator
            .run("Alpha fact. Bravo fact. And so on.", ProcessingMode::Concurrent)
            .await;

        assert_eq!(summary.claims, claims);
        assert_eq!(summary.results.len(), claims.len());
        assert_eq!(summary.stage_totals, aggregate_timings(&summary.results));
        assert!(summary.total_time >= summary.extraction_time);
    }

    #[tokio::test]
    async fn test_run_without_claims() {
        let orchestrator = orchestrator(
            ScriptedGateway::new().on("Strictly extract", "[]"),
            StaticSearch::new(),
            StaticRetriever::new(),
            OrchestratorConfig::default(),
        );

        let summary = orchestrator
            .run("Who was Ada Lovelace?", ProcessingMode::Sequential)
            .await;
        assert!(summary.claims.is_empty());
        assert!(summary.extraction_failure.is_none());
        assert!(summary.results.is_empty());
        assert_eq!(summary.average_claim_time(), None);
    }

    #[tokio::test]
    async fn test_run_recovers_from_extraction_failure() {
        let orchestrator = orchestrator(
            ScriptedGateway::new().fail_on("Strictly extract"),
            StaticSearch::new(),
            StaticRetriever::new(),
            OrchestratorConfig::default(),
        );

        let summary = orchestrator
            .run("Ada Lovelace was born in 1815.", ProcessingMode::Concurrent)
            .await;
        assert!(summary.claims.is_empty());
        assert!(summary.results.is_empty());
        let failure = summary.extraction_failure.expect("extraction failure recorded");
        assert!(failure.contains("503"), "unexpected failure: {failure}");
    }
}
