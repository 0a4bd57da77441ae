//! Web search collaborator: query in, ranked result URLs out.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{PipelineError, Result};

/// Google Custom Search JSON API endpoint.
pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// HTTP timeout for search requests in seconds.
pub const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Anything that can turn a query into ranked result URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `limit` result URLs. An empty list means nothing was found.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Google Custom Search client.
///
/// NOTE: Do NOT derive `Debug` on this struct; `api_key` would be exposed.
pub struct GoogleCustomSearch {
    http: reqwest::Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    link: Option<String>,
}

#[derive(Deserialize)]
struct SearchErrorResponse {
    error: Option<SearchErrorDetail>,
}

#[derive(Deserialize)]
struct SearchErrorDetail {
    message: String,
}

impl GoogleCustomSearch {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(PipelineError::SearchRequest)?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: GOOGLE_CSE_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
            ],
        )
        .map_err(|e| PipelineError::InvalidInput(format!("search endpoint: {e}")))
    }
}

#[async_trait]
impl SearchProvider for GoogleCustomSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let url = self.request_url(query)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(PipelineError::SearchRequest)?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SearchErrorResponse>(&body_text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body_text);
            return Err(PipelineError::SearchApiError { status, message });
        }

        let response: SearchResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::SearchResponseParse(e.to_string()))?;

        let urls: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|item| item.link)
            .filter(|link| !link.is_empty())
            .take(limit)
            .collect();

        debug!(query, limit, found = urls.len(), "search completed");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_query() {
        let search = GoogleCustomSearch::new("key-1", "engine-2").unwrap();
        let url = search.request_url("Ada Lovelace & Babbage").unwrap();

        assert!(url.as_str().starts_with(GOOGLE_CSE_ENDPOINT));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("key".to_string(), "key-1".to_string()),
                ("cx".to_string(), "engine-2".to_string()),
                ("q".to_string(), "Ada Lovelace & Babbage".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let search = GoogleCustomSearch::new("k", "c")
            .unwrap()
            .with_endpoint("not a url");
        assert!(matches!(
            search.request_url("q"),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
