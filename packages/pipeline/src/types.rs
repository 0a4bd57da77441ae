//! Data types shared by the pipeline stages, orchestrator and report.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Serialize durations as fractional seconds.
mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Truth label assigned by the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum Label {
    True,
    False,
}

/// How a verdict was obtained from the judge's raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    /// Well-formed JSON object.
    Parsed,
    /// Recovered by scanning free text.
    Heuristic,
}

/// The judge's determination plus the supporting excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub label: Label,
    pub evidence: String,
    pub source: VerdictSource,
}

/// Outcome of parsing a judge response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeOutcome {
    Parsed(Verdict),
    Heuristic(Verdict),
    Unparseable,
}

impl JudgeOutcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            JudgeOutcome::Parsed(v) | JudgeOutcome::Heuristic(v) => Some(v),
            JudgeOutcome::Unparseable => None,
        }
    }

    pub fn into_verdict(self) -> Option<Verdict> {
        match self {
            JudgeOutcome::Parsed(v) | JudgeOutcome::Heuristic(v) => Some(v),
            JudgeOutcome::Unparseable => None,
        }
    }
}

/// Per-claim pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Optimize,
    ArticleQuery,
    Search,
    Retrieve,
    Judge,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Optimize,
        Stage::ArticleQuery,
        Stage::Search,
        Stage::Retrieve,
        Stage::Judge,
    ];

    /// Human-readable description used in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Optimize => "Claim optimization",
            Stage::ArticleQuery => "Wiki query generation",
            Stage::Search => "URL fetching",
            Stage::Retrieve => "Content scraping",
            Stage::Judge => "Fact-checking",
        }
    }
}

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTimings {
    #[serde(with = "secs")]
    pub optimize: Duration,
    #[serde(with = "secs")]
    pub article_query: Duration,
    #[serde(with = "secs")]
    pub search: Duration,
    #[serde(with = "secs")]
    pub retrieve: Duration,
    #[serde(with = "secs")]
    pub judge: Duration,
}

impl StageTimings {
    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Optimize => self.optimize,
            Stage::ArticleQuery => self.article_query,
            Stage::Search => self.search,
            Stage::Retrieve => self.retrieve,
            Stage::Judge => self.judge,
        }
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        match stage {
            Stage::Optimize => self.optimize = elapsed,
            Stage::ArticleQuery => self.article_query = elapsed,
            Stage::Search => self.search = elapsed,
            Stage::Retrieve => self.retrieve = elapsed,
            Stage::Judge => self.judge = elapsed,
        }
    }

    pub fn add(&mut self, other: &StageTimings) {
        self.optimize += other.optimize;
        self.article_query += other.article_query;
        self.search += other.search;
        self.retrieve += other.retrieve;
        self.judge += other.judge;
    }

    pub fn total(&self) -> Duration {
        Stage::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Where processing of a claim ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ClaimStatus {
    /// All stages ran (the verdict may still be absent).
    Completed,
    /// Search produced no URL.
    NoUrlFound,
    /// No URL yielded page content.
    ScrapeFailed,
    /// The claim's worker failed unexpectedly.
    Failed(String),
}

impl ClaimStatus {
    /// True when the claim stopped before producing a source link.
    pub fn is_terminal_failure(&self) -> bool {
        !matches!(self, ClaimStatus::Completed)
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimStatus::Completed => f.write_str("completed"),
            ClaimStatus::NoUrlFound => f.write_str("no URL found"),
            ClaimStatus::ScrapeFailed => f.write_str("scrape failed"),
            ClaimStatus::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// A collaborator failure that a stage recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Everything known about one claim after it went through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimResult {
    pub claim: String,
    pub optimized: String,
    pub article_query: String,
    pub urls: Vec<String>,
    /// URL whose content was judged.
    pub source_url: Option<String>,
    /// Retrieval tier that produced the judged content.
    pub source_tier: Option<String>,
    pub verdict: Option<Verdict>,
    /// Evidence deep-link, or the bare source URL without evidence.
    pub link: Option<String>,
    pub status: ClaimStatus,
    pub failures: Vec<StageFailure>,
    pub timings: StageTimings,
    #[serde(with = "secs")]
    pub total: Duration,
}

impl ClaimResult {
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            optimized: String::new(),
            article_query: String::new(),
            urls: Vec::new(),
            source_url: None,
            source_tier: None,
            verdict: None,
            link: None,
            status: ClaimStatus::Completed,
            failures: Vec::new(),
            timings: StageTimings::default(),
            total: Duration::ZERO,
        }
    }

    /// Result for a claim whose worker died before producing anything.
    pub fn failed(claim: impl Into<String>, message: impl Into<String>) -> Self {
        let mut result = Self::new(claim);
        result.status = ClaimStatus::Failed(message.into());
        result
    }

    pub fn record_failure(&mut self, stage: Stage, message: impl Into<String>) {
        self.failures.push(StageFailure {
            stage,
            message: message.into(),
        });
    }
}

/// How claims of one query are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// One claim at a time, input order preserved.
    Sequential,
    /// Bounded worker pool, completion order.
    Concurrent,
}

/// Outcome of a whole query run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: ProcessingMode,
    pub query: String,
    pub claims: Vec<String>,
    #[serde(with = "secs")]
    pub extraction_time: Duration,
    /// Set when the extraction call failed and the run went on without claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_failure: Option<String>,
    #[serde(with = "secs")]
    pub total_time: Duration,
    pub results: Vec<ClaimResult>,
    /// Per-stage durations summed over all claims.
    pub stage_totals: StageTimings,
}

impl RunSummary {
    /// Time spent after claim extraction.
    pub fn processing_time(&self) -> Duration {
        self.total_time.saturating_sub(self.extraction_time)
    }

    pub fn average_claim_time(&self) -> Option<Duration> {
        if self.results.is_empty() {
            return None;
        }
        let total: Duration = self.results.iter().map(|r| r.total).sum();
        Some(total / self.results.len() as u32)
    }
}

/// Sum the stage timings of a result set.
pub fn aggregate_timings(results: &[ClaimResult]) -> StageTimings {
    let mut totals = StageTimings::default();
    for result in results {
        totals.add(&result.timings);
    }
    totals
}
