//! HTML cleanup and visible-text collection.
//!
//! Both HTML tiers run the same procedure: drop boilerplate elements matched
//! by [`REMOVE_SELECTORS`], then collect headings, paragraphs and list items
//! whose normalized text is longer than [`MIN_BLOCK_CHARS`].

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Boilerplate elements removed before text collection.
pub const REMOVE_SELECTORS: &[&str] = &[
    ".navbox",
    ".infobox",
    ".sidebar",
    ".reference",
    ".mw-editsection",
    ".mw-jump-link",
    ".toc",
    ".catlinks",
    ".mw-cite-backlink",
];

/// Elements whose text is collected.
pub const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li";

/// Primary-content container of a rendered Wikipedia page.
pub const ARTICLE_CONTAINER_SELECTOR: &str = "#mw-content-text .mw-parser-output";

/// Fragments must be strictly longer than this many characters.
pub const MIN_BLOCK_CHARS: usize = 10;

/// Separator between collected fragments.
const BLOCK_SEPARATOR: &str = "\n\n";

#[allow(clippy::expect_used)] // Static selectors that are guaranteed to be valid
static REMOVE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&REMOVE_SELECTORS.join(", ")).expect("valid selector"));

#[allow(clippy::expect_used)] // Static selectors that are guaranteed to be valid
static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(BLOCK_SELECTOR).expect("valid selector"));

#[allow(clippy::expect_used)] // Static selectors that are guaranteed to be valid
static ARTICLE_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(ARTICLE_CONTAINER_SELECTOR).expect("valid selector"));

/// Clean a whole HTML document and return its readable text.
///
/// Returns `None` when no fragment survives filtering.
pub fn document_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    join_blocks(collect_blocks(document.root_element()))
}

/// Clean a rendered article page, preferring its primary-content container.
///
/// Falls back to the whole document when the container is missing.
pub fn article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let scope = document
        .select(&ARTICLE_CONTAINER)
        .next()
        .unwrap_or_else(|| document.root_element());
    join_blocks(collect_blocks(scope))
}

/// Collect normalized text blocks below `scope`, skipping removed subtrees.
fn collect_blocks(scope: ElementRef<'_>) -> Vec<String> {
    let removed: HashSet<_> = scope.select(&REMOVE).map(|el| (*el).id()).collect();

    let mut blocks = Vec::new();
    for element in scope.select(&BLOCKS) {
        let block = *element;
        if removed.contains(&block.id()) || block.ancestors().any(|a| removed.contains(&a.id())) {
            continue;
        }

        let mut raw = String::new();
        for node in block.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let inside_removed = node
                .ancestors()
                .take_while(|a| a.id() != block.id())
                .any(|a| removed.contains(&a.id()));
            if !inside_removed {
                raw.push_str(text);
            }
        }

        let text = normalize_whitespace(&raw);
        if text.chars().count() > MIN_BLOCK_CHARS {
            blocks.push(text);
        }
    }

    blocks
}

fn join_blocks(blocks: Vec<String>) -> Option<String> {
    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join(BLOCK_SEPARATOR))
    }
}

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
