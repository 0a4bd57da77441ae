//! Tiered page retrieval.
//!
//! For reference-encyclopedia URLs the REST API is tried first (plain text,
//! then mobile HTML), because it is cheaper to parse and not subject to the
//! scraper blocking the HTML frontend applies. Everything else, and every
//! reference URL whose REST tiers came up empty, goes through a generic HTML
//! scrape.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::config::{extract_wiki_title, mobile_html_url, plain_text_url, RetrieverConfig};
use crate::error::{RetrieverError, Result};
use crate::html;
use crate::http::{create_client, get_text, pause};

/// Retrieval strategy that produced a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// REST plain-text endpoint.
    RestPlain,
    /// REST mobile-html endpoint with DOM cleanup.
    RestMobileHtml,
    /// Raw URL scraped as HTML with DOM cleanup.
    GenericHtml,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::RestPlain => "rest-plain",
            Tier::RestMobileHtml => "rest-mobile-html",
            Tier::GenericHtml => "generic-html",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cleaned page text together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    pub url: String,
    pub text: String,
    pub tier: Tier,
}

/// Anything that can turn a URL into page text.
///
/// The pipeline depends on this trait rather than on [`TextRetriever`] so that
/// tests can substitute canned pages.
#[async_trait]
pub trait PageRetriever: Send + Sync {
    async fn retrieve(&self, url: &str) -> Result<Retrieved>;
}

/// Tiered retriever backed by a shared HTTP client.
#[derive(Debug, Clone)]
pub struct TextRetriever {
    client: Client,
    config: RetrieverConfig,
}

impl TextRetriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }

    /// Build a retriever around an existing client.
    pub fn with_client(client: Client, config: RetrieverConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve page text, returning `None` on any failure.
    pub async fn retrieve_text(&self, url: &str) -> Option<String> {
        self.retrieve_page(url).await.ok().map(|page| page.text)
    }

    /// Run the tier chain for `url`. The first tier yielding text wins.
    pub async fn retrieve_page(&self, url: &str) -> Result<Retrieved> {
        if let Some(title) = extract_wiki_title(url, &self.config.reference_host) {
            debug!(url, title = %title, "Reference article detected, trying REST tiers");

            match self.rest_plain_text(&title).await {
                Ok(Some(text)) => return Ok(self.found(url, text, Tier::RestPlain)),
                Ok(None) => debug!(title = %title, "Plain-text tier returned no content"),
                Err(e) => debug!(title = %title, error = %e, "Plain-text tier failed"),
            }

            match self.rest_mobile_html(&title).await {
                Ok(Some(text)) => return Ok(self.found(url, text, Tier::RestMobileHtml)),
                Ok(None) => debug!(title = %title, "Mobile-html tier returned no content"),
                Err(e) => debug!(title = %title, error = %e, "Mobile-html tier failed"),
            }

            pause(self.config.fallback_pause).await;
        }

        match self.generic_html(url).await {
            Ok(text) => Ok(self.found(url, text, Tier::GenericHtml)),
            Err(e) => {
                error!(url, error = %e, "Page retrieval failed");
                Err(e)
            }
        }
    }

    fn found(&self, url: &str, text: String, tier: Tier) -> Retrieved {
        info!(url, tier = %tier, chars = text.len(), "Retrieved page content");
        Retrieved {
            url: url.to_string(),
            text,
            tier,
        }
    }

    /// Plain-text REST endpoint; the body is used verbatim.
    async fn rest_plain_text(&self, title: &str) -> Result<Option<String>> {
        let url = plain_text_url(&self.config.rest_base_url, title);
        let body = get_text(&self.client, &url, None, &self.config).await?;
        if body.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }

    /// Mobile-html REST endpoint with boilerplate removal.
    async fn rest_mobile_html(&self, title: &str) -> Result<Option<String>> {
        let url = mobile_html_url(&self.config.rest_base_url, title);
        let body = get_text(&self.client, &url, Some("text/html"), &self.config).await?;
        Ok(html::document_text(&body))
    }

    /// Generic HTML scrape. HTTP errors propagate to the caller.
    async fn generic_html(&self, url: &str) -> Result<String> {
        let body = get_text(&self.client, url, None, &self.config).await?;
        html::article_text(&body).ok_or_else(|| RetrieverError::NoContent(url.to_string()))
    }
}

#[async_trait]
impl PageRetriever for TextRetriever {
    async fn retrieve(&self, url: &str) -> Result<Retrieved> {
        self.retrieve_page(url).await
    }
}
