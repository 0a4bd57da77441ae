//! Command-line interface for the fact-checker.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;
use factcheck_retriever::{RetrieverConfig, TextRetriever};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::FactcheckConfig;
use crate::error::Result;
use crate::gateway::OpenAiClient;
use crate::orchestrator::ClaimOrchestrator;
use crate::report::{render_comparison, render_run};
use crate::search::GoogleCustomSearch;
use crate::types::{ProcessingMode, RunSummary};

/// Factcheck - Check the claims in a query against Wikipedia.
#[derive(Parser, Debug)]
#[command(name = "factcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The query text to analyze
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Number of search results to consider per claim
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Process claims one at a time instead of concurrently
    #[arg(long, conflicts_with = "compare")]
    pub sequential: bool,

    /// Run sequentially, then concurrently, and compare timings
    #[arg(long)]
    pub compare: bool,

    /// Base URL of an OpenAI-compatible server (e.g. a local model)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model to use for every LLM call
    #[arg(long)]
    pub model: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The query as a single string.
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    pub fn mode(&self) -> ProcessingMode {
        if self.sequential {
            ProcessingMode::Sequential
        } else {
            ProcessingMode::Concurrent
        }
    }

    /// Value a flag supplies for a configuration variable, if any.
    fn override_for(&self, key: &str) -> Option<String> {
        match key {
            "LLM_API_BASE_URL" => self.base_url.clone(),
            "LLM_MODEL" => self.model.clone(),
            "FACTCHECK_TOP_N" => self.top_n.map(|n| n.to_string()),
            _ => None,
        }
    }

    /// Resolve configuration, letting flags override the environment.
    pub fn config(&self) -> Result<FactcheckConfig> {
        FactcheckConfig::from_lookup(|key| {
            self.override_for(key)
                .or_else(|| std::env::var(key).ok())
        })
    }
}

/// Build the orchestrator with live collaborators.
pub fn build_orchestrator(config: &FactcheckConfig) -> Result<ClaimOrchestrator> {
    let gateway = OpenAiClient::new(&config.llm)?;
    let search = GoogleCustomSearch::new(&config.search_api_key, &config.search_engine_id)?;
    let retriever = TextRetriever::new(RetrieverConfig::default())?;

    Ok(ClaimOrchestrator::new(
        Arc::new(gateway),
        Arc::new(search),
        Arc::new(retriever),
        config.orchestrator_config(),
    ))
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn run_mode(
    orchestrator: &ClaimOrchestrator,
    query: &str,
    mode: ProcessingMode,
) -> RunSummary {
    let pb = spinner(format!("Checking claims ({mode})..."));
    let summary = orchestrator.run(query, mode).await;
    pb.finish_and_clear();
    summary
}

/// Run the CLI.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;
    let orchestrator = build_orchestrator(&config)?;
    let query = cli.query_text();

    if !cli.json {
        println!("{} {}", style("Fact-checking").bold(), style(&query).cyan());
        println!();
    }

    if cli.compare {
        let sequential = run_mode(&orchestrator, &query, ProcessingMode::Sequential).await;
        let concurrent = run_mode(&orchestrator, &query, ProcessingMode::Concurrent).await;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&[&sequential, &concurrent])?
            );
        } else {
            println!("{}", render_run(&sequential));
            println!();
            println!("{}", render_run(&concurrent));
            println!();
            println!("{}", render_comparison(&sequential, &concurrent));
        }
        return Ok(());
    }

    let summary = run_mode(&orchestrator, &query, cli.mode()).await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_run(&summary));
    }

    Ok(())
}
