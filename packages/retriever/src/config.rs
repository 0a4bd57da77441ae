//! Configuration constants and URL helpers for the retriever.

use std::time::Duration;

use url::Url;

/// Host of the reference encyclopedia. Subdomains (`en.`, `de.`, ...) match too.
pub const DEFAULT_REFERENCE_HOST: &str = "wikipedia.org";

/// Base URL of the Wikipedia REST API.
pub const DEFAULT_REST_BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1";

/// Base URL for article links built from a title.
pub const WIKI_ARTICLE_BASE_URL: &str = "https://en.wikipedia.org/wiki";

/// HTTP timeout in seconds, applied to every request.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Pause between exhausting the REST tiers and the generic scrape.
pub const DEFAULT_FALLBACK_PAUSE_MS: u64 = 400;

/// Runtime configuration for [`crate::TextRetriever`].
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub reference_host: String,
    pub rest_base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub fallback_pause: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            reference_host: DEFAULT_REFERENCE_HOST.to_string(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            fallback_pause: Duration::from_millis(DEFAULT_FALLBACK_PAUSE_MS),
        }
    }
}

impl RetrieverConfig {
    pub fn with_reference_host(mut self, host: impl Into<String>) -> Self {
        self.reference_host = host.into();
        self
    }

    pub fn with_rest_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.rest_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_fallback_pause(mut self, pause: Duration) -> Self {
        self.fallback_pause = pause;
        self
    }
}

/// Extract the canonical article title from a reference-encyclopedia URL.
///
/// `https://en.wikipedia.org/wiki/Ada_Lovelace` yields `Ada_Lovelace`.
/// Query strings and fragments are ignored. Returns `None` when the host does
/// not belong to `reference_host` or the path is not `/wiki/<title>`.
///
/// # Examples
/// ```
/// use factcheck_retriever::config::extract_wiki_title;
///
/// assert_eq!(
///     extract_wiki_title("https://en.wikipedia.org/wiki/Ada_Lovelace#Early_life", "wikipedia.org"),
///     Some("Ada_Lovelace".to_string())
/// );
/// assert_eq!(extract_wiki_title("https://example.com/wiki/Ada", "wikipedia.org"), None);
/// ```
pub fn extract_wiki_title(url: &str, reference_host: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let on_reference_host =
        host == reference_host || host.ends_with(&format!(".{reference_host}"));
    if !on_reference_host {
        return None;
    }

    let encoded = parsed.path().strip_prefix("/wiki/")?;
    if encoded.is_empty() {
        return None;
    }

    let title = urlencoding::decode(encoded).ok()?;
    Some(title.into_owned())
}

/// Build the public article URL for a title.
pub fn wiki_article_url(title: &str) -> String {
    format!("{WIKI_ARTICLE_BASE_URL}/{}", urlencoding::encode(title))
}

/// Build the REST plain-text endpoint URL for a title.
pub fn plain_text_url(rest_base_url: &str, title: &str) -> String {
    format!("{rest_base_url}/page/plain/{}", urlencoding::encode(title))
}

/// Build the REST mobile-html endpoint URL for a title.
pub fn mobile_html_url(rest_base_url: &str, title: &str) -> String {
    format!(
        "{rest_base_url}/page/mobile-html/{}",
        urlencoding::encode(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_basic() {
        assert_eq!(
            extract_wiki_title("https://en.wikipedia.org/wiki/Ada_Lovelace", DEFAULT_REFERENCE_HOST),
            Some("Ada_Lovelace".to_string())
        );
    }

    #[test]
    fn test_extract_title_ignores_query_and_fragment() {
        assert_eq!(
            extract_wiki_title(
                "https://en.wikipedia.org/wiki/Ada_Lovelace?oldid=1#Early_life",
                DEFAULT_REFERENCE_HOST
            ),
            Some("Ada_Lovelace".to_string())
        );
    }

    #[test]
    fn test_extract_title_percent_decodes() {
        assert_eq!(
            extract_wiki_title("https://de.wikipedia.org/wiki/Kurt_G%C3%B6del", DEFAULT_REFERENCE_HOST),
            Some("Kurt_Gödel".to_string())
        );
    }

    #[test]
    fn test_extract_title_rejects_other_hosts() {
        assert_eq!(extract_wiki_title("https://example.com/wiki/Ada", DEFAULT_REFERENCE_HOST), None);
        assert_eq!(
            extract_wiki_title("https://notwikipedia.org/wiki/Ada", DEFAULT_REFERENCE_HOST),
            None
        );
    }

    #[test]
    fn test_extract_title_rejects_non_article_paths() {
        assert_eq!(
            extract_wiki_title("https://en.wikipedia.org/w/index.php?title=Ada", DEFAULT_REFERENCE_HOST),
            None
        );
        assert_eq!(extract_wiki_title("https://en.wikipedia.org/wiki/", DEFAULT_REFERENCE_HOST), None);
        assert_eq!(extract_wiki_title("not a url", DEFAULT_REFERENCE_HOST), None);
    }

    #[test]
    fn test_title_round_trip() {
        for title in ["Ada_Lovelace", "Kurt_Gödel", "C++", "AC/DC", "Brontë_family", "100%_(album)"] {
            let url = wiki_article_url(title);
            assert_eq!(
                extract_wiki_title(&url, DEFAULT_REFERENCE_HOST).as_deref(),
                Some(title),
                "round trip failed for {url}"
            );
        }
    }

    #[test]
    fn test_rest_urls() {
        assert_eq!(
            plain_text_url(DEFAULT_REST_BASE_URL, "Ada_Lovelace"),
            "https://en.wikipedia.org/api/rest_v1/page/plain/Ada_Lovelace"
        );
        assert_eq!(
            mobile_html_url(DEFAULT_REST_BASE_URL, "AC/DC"),
            "https://en.wikipedia.org/api/rest_v1/page/mobile-html/AC%2FDC"
        );
    }

    #[test]
    fn test_config_builders() {
        let config = RetrieverConfig::default()
            .with_rest_base_url("http://127.0.0.1:9000/api/")
            .with_max_retries(0)
            .with_fallback_pause(Duration::ZERO);
        assert_eq!(config.rest_base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.fallback_pause, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(HTTP_TIMEOUT_SECS));
    }
}
