//! Human-readable rendering of claim results and run summaries.

use std::time::Duration;

use console::style;

use crate::types::{ClaimResult, ClaimStatus, Label, RunSummary, Stage, VerdictSource};

const RULE_WIDTH: usize = 50;

fn secs(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}

fn or_none(value: &str) -> String {
    if value.is_empty() {
        style("(none)").dim().to_string()
    } else {
        value.to_string()
    }
}

/// Render one claim's result.
pub fn render_claim(result: &ClaimResult) -> String {
    let mut lines = vec![format!(
        "{} {}",
        style("Claim:").bold(),
        style(&result.claim).cyan()
    )];

    lines.push(format!("  Optimized: {}", or_none(&result.optimized)));
    lines.push(format!("  Article: {}", or_none(&result.article_query)));
    lines.push(format!("  URLs: {}", or_none(&result.urls.join(", "))));

    if let Some(url) = &result.source_url {
        let tier = result.source_tier.as_deref().unwrap_or("unknown");
        lines.push(format!("  Source: {url} [{tier}]"));
    }

    match &result.verdict {
        Some(verdict) => {
            let label = match verdict.label {
                Label::True => style(verdict.label.to_string()).green().bold(),
                Label::False => style(verdict.label.to_string()).red().bold(),
            };
            let guessed = if verdict.source == VerdictSource::Heuristic {
                format!(" {}", style("(guessed from unstructured response)").yellow())
            } else {
                String::new()
            };
            lines.push(format!("  Label: {label}{guessed}"));
            lines.push(format!("  Evidence: {}", or_none(&verdict.evidence)));
        }
        None if result.status == ClaimStatus::Completed => {
            lines.push(format!("  Label: {}", style("no verdict").yellow()));
        }
        None => {}
    }

    if let Some(link) = &result.link {
        lines.push(format!("  Link: {}", style(link).underlined()));
    }

    let status = if result.status.is_terminal_failure() {
        style(result.status.to_string()).red()
    } else {
        style(result.status.to_string()).green()
    };
    lines.push(format!("  Status: {status}"));

    for failure in &result.failures {
        lines.push(format!(
            "  {} {}: {}",
            style("!").yellow().bold(),
            failure.stage,
            failure.message
        ));
    }

    let timings: Vec<String> = Stage::ALL
        .iter()
        .map(|stage| format!("{stage} {}", secs(result.timings.get(*stage))))
        .collect();
    lines.push(format!(
        "  Timings: {} (total {})",
        timings.join(", "),
        secs(result.total)
    ));

    lines.join("\n")
}

/// Render the summary block for a run.
pub fn render_summary(summary: &RunSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let title = format!("{} SUMMARY", summary.mode.to_string().to_uppercase());

    let mut lines = vec![
        rule.clone(),
        style(title).bold().to_string(),
        rule,
        format!("Total processing time: {}", secs(summary.total_time)),
        format!("Claims extraction time: {}", secs(summary.extraction_time)),
        format!("Claims processing time: {}", secs(summary.processing_time())),
    ];

    if let Some(average) = summary.average_claim_time() {
        lines.push(format!("Average time per claim: {}", secs(average)));
    }

    let count = |label: Label| {
        summary
            .results
            .iter()
            .filter(|r| r.verdict.as_ref().is_some_and(|v| v.label == label))
            .count()
    };
    let undecided = summary.results.iter().filter(|r| r.verdict.is_none()).count();
    lines.push(format!(
        "Verdicts: {} true, {} false, {} without verdict",
        count(Label::True),
        count(Label::False),
        undecided
    ));

    if !summary.results.is_empty() {
        lines.push(String::new());
        lines.push("Timing breakdown:".to_string());
        for stage in Stage::ALL {
            lines.push(format!(
                "  - {}: {}",
                stage.description(),
                secs(summary.stage_totals.get(stage))
            ));
        }
    }

    lines.join("\n")
}

/// Render a full run: the claims found, each result, then the summary.
pub fn render_run(summary: &RunSummary) -> String {
    let mut sections = vec![format!(
        "{} {}\n{} {:?} (extraction took {})",
        style("Query:").bold(),
        summary.query,
        style("Claims:").bold(),
        summary.claims,
        secs(summary.extraction_time)
    )];

    if let Some(failure) = &summary.extraction_failure {
        sections.push(format!(
            "{} claim extraction failed: {failure}",
            style("!").yellow().bold()
        ));
    }

    if summary.claims.is_empty() {
        sections.push("No claims found to process".to_string());
    }

    sections.extend(summary.results.iter().map(render_claim));
    sections.push(render_summary(summary));
    sections.join("\n\n")
}

/// Render a sequential and a concurrent run of the same query side by side.
pub fn render_comparison(sequential: &RunSummary, concurrent: &RunSummary) -> String {
    let mut sections = vec![render_summary(sequential), render_summary(concurrent)];

    let concurrent_secs = concurrent.total_time.as_secs_f64();
    if concurrent_secs > 0.0 {
        sections.push(format!(
            "{} {:.2}x",
            style("Speedup:").bold(),
            sequential.total_time.as_secs_f64() / concurrent_secs
        ));
    }

    sections.join("\n\n")
}
