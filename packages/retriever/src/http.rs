//! HTTP client wrapper shared by every retrieval tier.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

use crate::config::RetrieverConfig;
use crate::error::{RetrieverError, Result};

/// User agent string identifying this retriever, as Wikipedia's UA policy asks.
pub const USER_AGENT: &str = concat!(
    "factcheck-retriever/",
    env!("CARGO_PKG_VERSION"),
    " (claim fact-checking pipeline; https://github.com/factcheck/factcheck)"
);

/// Default `Accept` header sent with every request.
const DEFAULT_ACCEPT: &str = "text/html,*/*";

/// Create a configured HTTP client.
///
/// The client keeps a connection pool, so one instance should be shared by
/// all requests of a run.
pub fn create_client(config: &RetrieverConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));

    let client = Client::builder()
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Fetch a URL as text with retry logic.
///
/// Retries with exponential backoff on transient failures (connection errors,
/// timeouts, 5xx responses). Client errors (4xx) are returned immediately as
/// [`RetrieverError::Status`].
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to fetch
/// * `accept` - Optional `Accept` header overriding the client default
/// * `config` - Retry settings
pub async fn get_text(
    client: &Client,
    url: &str,
    accept: Option<&str>,
    config: &RetrieverConfig,
) -> Result<String> {
    let max_retries = config.max_retries.max(1);
    let mut last_error: Option<String> = None;

    for attempt in 0..max_retries {
        if attempt > 0 {
            // Exponential backoff: base, 2 * base, 4 * base, ...
            let delay = config.retry_base_delay * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, url, "Retrying after delay");
            tokio::time::sleep(delay).await;
        }

        let mut request = client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        url,
                        attempt = attempt + 1,
                        max_retries,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                if !status.is_success() {
                    return Err(RetrieverError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                return Ok(response.text().await?);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        url,
                        attempt = attempt + 1,
                        max_retries,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(RetrieverError::Http(e));
            }
        }
    }

    Err(RetrieverError::RetriesExhausted {
        attempts: max_retries,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Sleep for the configured pause, skipping zero durations.
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
