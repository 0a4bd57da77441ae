//! Turning raw model text into claims and verdicts.
//!
//! Models do not always follow the requested format, so each parser tries a
//! strict decode first and then progressively looser recovery.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::types::{JudgeOutcome, Label, Verdict, VerdictSource};

/// Characters of raw judge text kept as evidence when none can be located.
pub const HEURISTIC_EVIDENCE_CHARS: usize = 200;

#[allow(clippy::expect_used)] // Static regex pattern is guaranteed to be valid
static ARRAY_LAZY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid array regex"));

#[allow(clippy::expect_used)] // Static regex pattern is guaranteed to be valid
static ARRAY_GREEDY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

#[allow(clippy::expect_used)] // Static regex pattern is guaranteed to be valid
static VERDICT_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^}]*"label"[^}]*"evidence"[^}]*\}"#).expect("valid verdict regex")
});

#[allow(clippy::expect_used)] // Static regex pattern is guaranteed to be valid
static EVIDENCE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""evidence":\s*"([^"]*)""#).expect("valid evidence regex")
});

#[derive(Deserialize)]
struct RawVerdict {
    label: String,
    #[serde(default)]
    evidence: String,
}

/// Parse the extraction response into claims.
///
/// Accepts a bare JSON array of strings, or the first array embedded in
/// surrounding prose. Anything else yields no claims. Blank entries are
/// dropped.
pub fn parse_claims(text: &str) -> Vec<String> {
    let trimmed = text.trim();

    let parsed = decode_claims(trimmed).or_else(|| {
        [&ARRAY_LAZY, &ARRAY_GREEDY]
            .into_iter()
            .filter_map(|re| re.find(trimmed))
            .find_map(|m| decode_claims(m.as_str()))
    });

    parsed
        .unwrap_or_default()
        .into_iter()
        .map(|claim| claim.trim().to_string())
        .filter(|claim| !claim.is_empty())
        .collect()
}

fn decode_claims(text: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text).ok()
}

/// Parse the judge response.
///
/// A well-formed `{"label", "evidence"}` object (bare or embedded) gives a
/// [`JudgeOutcome::Parsed`] verdict. Otherwise the label is guessed from
/// whether the text mentions "true" and the evidence is lifted from an
/// `"evidence": "..."` fragment or the start of the text, giving
/// [`JudgeOutcome::Heuristic`]. Blank text is [`JudgeOutcome::Unparseable`].
pub fn parse_judge(text: &str) -> JudgeOutcome {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return JudgeOutcome::Unparseable;
    }

    if let Some(verdict) = decode_verdict(trimmed) {
        return JudgeOutcome::Parsed(verdict);
    }

    if let Some(verdict) = VERDICT_OBJECT
        .find(trimmed)
        .and_then(|m| decode_verdict(m.as_str()))
    {
        return JudgeOutcome::Parsed(verdict);
    }

    let label = if trimmed.to_lowercase().contains("true") {
        Label::True
    } else {
        Label::False
    };

    let evidence = match EVIDENCE_FIELD.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => trimmed.chars().take(HEURISTIC_EVIDENCE_CHARS).collect(),
    };

    JudgeOutcome::Heuristic(Verdict {
        label,
        evidence,
        source: VerdictSource::Heuristic,
    })
}

fn decode_verdict(text: &str) -> Option<Verdict> {
    let raw: RawVerdict = serde_json::from_str(text).ok()?;
    let label = Label::from_str(raw.label.trim()).ok()?;
    Some(Verdict {
        label,
        evidence: raw.evidence.trim().to_string(),
        source: VerdictSource::Parsed,
    })
}
