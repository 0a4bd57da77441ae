//! Canned collaborators for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use factcheck_retriever::{PageRetriever, Retrieved, RetrieverError, Tier};

use crate::error::{PipelineError, Result};
use crate::search::SearchProvider;

/// Search provider answering from a fixed query table.
///
/// Unknown queries find nothing. Queries registered with
/// [`StaticSearch::fail_on`] return an API error.
#[derive(Default)]
pub struct StaticSearch {
    results: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    /// Every query seen so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        if self.failing.iter().any(|q| q == query) {
            return Err(PipelineError::SearchApiError {
                status: 500,
                message: format!("scripted failure for '{query}'"),
            });
        }

        let mut urls = self.results.get(query).cloned().unwrap_or_default();
        urls.truncate(limit);
        Ok(urls)
    }
}

enum Page {
    Text { text: String, delay: Duration },
    Panic,
}

/// Retriever serving fixed page text per URL.
///
/// Unknown URLs fail with [`RetrieverError::NoContent`].
#[derive(Default)]
pub struct StaticRetriever {
    pages: HashMap<String, Page>,
    requested: Mutex<Vec<String>>,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, text: &str) -> Self {
        self.with_delay(url, text, Duration::ZERO)
    }

    /// Serve `text` for `url` after sleeping for `delay`.
    pub fn with_delay(mut self, url: &str, text: &str, delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Text {
                text: text.to_string(),
                delay,
            },
        );
        self
    }

    /// Panic when `url` is requested.
    pub fn panic_on(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Page::Panic);
        self
    }

    /// Every URL requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageRetriever for StaticRetriever {
    async fn retrieve(&self, url: &str) -> factcheck_retriever::Result<Retrieved> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }

        match self.pages.get(url) {
            Some(Page::Text { text, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(Retrieved {
                    url: url.to_string(),
                    text: text.clone(),
                    tier: Tier::RestPlain,
                })
            }
            #[allow(clippy::panic)]
            Some(Page::Panic) => panic!("scripted panic retrieving {url}"),
            None => Err(RetrieverError::NoContent(url.to_string())),
        }
    }
}
