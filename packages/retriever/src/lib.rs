//! Factcheck Retriever - fetch readable text for a source URL.
//!
//! Retrieval runs a fallback chain. For Wikipedia article URLs the REST API
//! plain-text endpoint is tried first, then the REST mobile-html endpoint with
//! boilerplate removed, and finally a generic HTML scrape of the URL itself.
//! Non-Wikipedia URLs go straight to the generic scrape.
//!
//! # Example
//!
//! ```
//! use factcheck_retriever::config::{extract_wiki_title, DEFAULT_REFERENCE_HOST};
//!
//! let title = extract_wiki_title("https://en.wikipedia.org/wiki/Ada_Lovelace", DEFAULT_REFERENCE_HOST);
//! assert_eq!(title.as_deref(), Some("Ada_Lovelace"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, [`RetrieverConfig`] and URL helpers
//! - [`error`]: Error types and Result alias
//! - [`http`]: Shared HTTP client with retry
//! - [`html`]: Boilerplate removal and text collection
//! - [`retriever`]: The tiered [`TextRetriever`] and the [`PageRetriever`] trait

pub mod config;
pub mod error;
pub mod html;
pub mod http;
pub mod retriever;

pub use config::{extract_wiki_title, RetrieverConfig};
pub use error::{Result, RetrieverError};
pub use retriever::{PageRetriever, Retrieved, TextRetriever, Tier};
