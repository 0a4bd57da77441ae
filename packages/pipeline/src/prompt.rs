//! Prompt templates and relevant-content selection for the judge.

use std::sync::LazyLock;

use regex::Regex;

const EXTRACT_CLAIMS: &str = include_str!("../prompts/extract_claims.txt");
const OPTIMIZE_CLAIM: &str = include_str!("../prompts/optimize_claim.txt");
const ARTICLE_NAME: &str = include_str!("../prompts/article_name.txt");
const JUDGE: &str = include_str!("../prompts/judge.txt");

/// Default cap on the page text handed to the judge, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 8000;

#[allow(clippy::expect_used)] // Static regex pattern is guaranteed to be valid
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("valid year regex"));

/// Build the prompt asking for the fact-checkable claims in a query.
pub fn build_extract_claims_prompt(query: &str) -> String {
    fill(EXTRACT_CLAIMS, &[("query", query)])
}

/// Build the prompt rewriting a claim into a self-contained assertion.
pub fn build_optimize_prompt(claim: &str) -> String {
    fill(OPTIMIZE_CLAIM, &[("claim", claim)])
}

/// Build the prompt asking which reference article answers a claim.
pub fn build_article_prompt(claim: &str) -> String {
    fill(ARTICLE_NAME, &[("claim", claim)])
}

/// Build the judge prompt. `content` should already be trimmed to size.
pub fn build_judge_prompt(claim: &str, content: &str) -> String {
    fill(JUDGE, &[("claim", claim), ("scraped", content)])
}

/// Substitute `{name}` placeholders in a single pass, so values that happen
/// to contain placeholder syntax are left alone.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let template = template.trim_end();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        for (name, value) in vars {
            let placeholder = format!("{{{name}}}");
            if tail.starts_with(&placeholder) {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
                continue 'scan;
            }
        }
        out.push('{');
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

/// Terms whose presence marks a paragraph as relevant to the claim: years
/// and capitalized words longer than three characters, lowercased.
fn key_terms(claim: &str) -> Vec<String> {
    let mut terms: Vec<String> = YEAR.find_iter(claim).map(|m| m.as_str().to_string()).collect();

    for word in claim.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
        if starts_upper && word.chars().count() > 3 {
            terms.push(word.to_lowercase());
        }
    }

    terms
}

/// Longest prefix of `s` holding at most `max` characters.
fn prefix_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Reduce page text to at most `max_chars` characters, preferring paragraphs
/// that mention the claim's key terms.
///
/// Text already within the limit is returned unchanged. Otherwise paragraphs
/// (separated by blank lines) are ranked by how many key terms they contain,
/// appended best-first while they fit, and the start of the article fills any
/// remaining room in front.
pub fn select_relevant_content(claim: &str, content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let terms = key_terms(claim);

    let mut ranked: Vec<(usize, &str)> = content
        .split("\n\n")
        .filter_map(|paragraph| {
            let lower = paragraph.to_lowercase();
            let score = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (score > 0).then_some((score, paragraph))
        })
        .collect();
    // Stable: equally relevant paragraphs keep article order.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let mut selected = String::new();
    let mut selected_len = 0;
    for (_, paragraph) in ranked {
        let len = paragraph.chars().count();
        if selected_len + len > max_chars {
            break;
        }
        selected.push_str(paragraph);
        selected.push_str("\n\n");
        selected_len += len + 2;
    }

    if selected_len < max_chars {
        let beginning = prefix_chars(content, max_chars - selected_len);
        selected = format!("{beginning}\n\n{selected}");
    }

    prefix_chars(&selected, max_chars).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_templates_fill_placeholders() {
        let prompt = build_extract_claims_prompt("Ada Lovelace was born in 1815.");
        assert!(prompt.ends_with("return an empty array: \"Ada Lovelace was born in 1815.\""));

        let prompt = build_optimize_prompt("She was born in 1815");
        assert!(prompt.ends_with("Claim: She was born in 1815"));

        let prompt = build_article_prompt("Paris is in France");
        assert_eq!(
            prompt,
            "Return the name of the wikipedia article that contains the answer to the claim \"Paris is in France\""
        );
    }

    #[test]
    fn test_judge_prompt_keeps_json_example() {
        let prompt = build_judge_prompt("X", "page text");
        assert!(prompt.contains(r#"{"label": "True" or "False", "evidence":"#));
        assert!(prompt.contains("Claim: \"X\""));
        assert!(prompt.ends_with("Scraped Content:\npage text"));
        assert!(!prompt.contains("{claim}"));
        assert!(!prompt.contains("{scraped}"));
    }

    #[test]
    fn test_fill_does_not_expand_values() {
        let prompt = build_judge_prompt("mentions {scraped}", "body");
        assert!(prompt.contains("Claim: \"mentions {scraped}\""));
        assert!(prompt.ends_with("body"));
    }

    #[test]
    fn test_key_terms() {
        let terms = key_terms("Ada Lovelace was born in 1815, in London.");
        assert_eq!(terms, vec!["1815", "lovelace", "london"]);
    }

    #[test]
    fn test_short_content_unchanged() {
        let content = "Short article.\n\nSecond paragraph.";
        assert_eq!(select_relevant_content("claim", content, 8000), content);
    }

    #[test]
    fn test_relevant_paragraphs_ranked_first() {
        let filler = "Unrelated filler text about something else entirely. ".repeat(4);
        let content = format!(
            "{filler}\n\nLovelace met Babbage.\n\n{filler}\n\nLovelace was born in 1815 in London."
        );
        let selected = select_relevant_content("Lovelace was born in 1815", &content, 120);

        assert!(selected.chars().count() <= 120);
        let best = selected.find("Lovelace was born in 1815 in London.").unwrap();
        let second = selected.find("Lovelace met Babbage.").unwrap();
        assert!(best < second);
        // The article start fills the room in front of the ranked paragraphs.
        assert!(selected.starts_with("Unrelated filler"));
    }

    #[test]
    fn test_no_relevant_paragraphs_keeps_beginning() {
        let content = "abcdefghij".repeat(10);
        let selected = select_relevant_content("nothing matches here", &content, 25);
        assert_eq!(selected, "abcdefghijabcdefghijabcde");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let content = "Gödel ".repeat(50);
        let selected = select_relevant_content("Gödel proved it", &content, 7);
        assert_eq!(selected.chars().count(), 7);
    }
}
