//! Wikipedia content retrieval
//!
//! `KnowledgeSource` is the seam between the pipeline and the encyclopedia. The
//! production implementation talks to the MediaWiki action API; tests substitute
//! an in-process mock.

pub mod client;
pub mod lookup;

pub use client::WikipediaClient;
pub use lookup::{lookup_summary, SummaryLookup};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved encyclopedia page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPage {
    pub title: String,
    pub page_id: u64,
    pub url: String,
}

/// Titles returned by a full-text search plus the engine's spelling suggestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub titles: Vec<String>,
    pub suggestion: Option<String>,
}

/// Wikipedia retrieval errors
#[derive(Debug, Clone, Error)]
pub enum WikiError {
    #[error("{0}")]
    PageNotFound(String),
    #[error("\"{title}\" may refer to several pages")]
    Disambiguation { title: String, options: Vec<String> },
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Source of encyclopedia summaries and page HTML
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Full-text search returning up to `limit` titles
    async fn search(&self, query: &str, limit: u32) -> Result<SearchResults, WikiError>;

    /// Resolve a query to a single article, following redirects
    ///
    /// With `auto_suggest` the query is first replaced by the search engine's
    /// suggestion or top hit. Disambiguation pages are reported as
    /// `WikiError::Disambiguation` carrying the linked article titles.
    async fn page(&self, query: &str, auto_suggest: bool) -> Result<WikiPage, WikiError>;

    /// Plain-text intro of the article `query` resolves to, cut to `sentences`
    async fn summary(
        &self,
        query: &str,
        sentences: u32,
        auto_suggest: bool,
    ) -> Result<String, WikiError>;

    /// Rendered article HTML
    async fn page_html(&self, page: &WikiPage) -> Result<String, WikiError>;
}
