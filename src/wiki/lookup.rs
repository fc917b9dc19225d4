//! Concept lookup with search fallback
//!
//! A concept typed by a student rarely matches an article title exactly. The
//! lookup first asks for the summary directly; when no page matches it retries
//! with the top full-text search hit and reports which title was used.

use super::{KnowledgeSource, WikiError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const NO_SUMMARY_FOUND: &str = "No Wikipedia summary found for this concept.";
pub const NO_PAGE_FOUND: &str = "No Wikipedia page found for that concept.";

/// Number of search hits considered when the direct lookup misses
const FALLBACK_SEARCH_LIMIT: u32 = 10;

/// Summary text plus the title actually used when it differs from the concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLookup {
    pub text: String,
    pub resolved_title: Option<String>,
}

/// Fetch the intro summary for `concept`, falling back to the top search hit
pub async fn lookup_summary(
    source: &dyn KnowledgeSource,
    concept: &str,
    sentences: u32,
    auto_suggest: bool,
) -> Result<SummaryLookup, WikiError> {
    match source.summary(concept, sentences, auto_suggest).await {
        Ok(text) if !text.trim().is_empty() => Ok(SummaryLookup {
            text,
            resolved_title: None,
        }),
        Ok(_) => Err(WikiError::PageNotFound(NO_SUMMARY_FOUND.to_string())),
        Err(WikiError::PageNotFound(reason)) => {
            info!("No direct page for '{}' ({}), trying search", concept, reason);
            let results = source.search(concept, FALLBACK_SEARCH_LIMIT).await?;

            let Some(first) = results.titles.into_iter().next() else {
                return Err(WikiError::PageNotFound(NO_PAGE_FOUND.to_string()));
            };

            match source.summary(&first, sentences, auto_suggest).await {
                Ok(text) if !text.trim().is_empty() => Ok(SummaryLookup {
                    text,
                    resolved_title: Some(first),
                }),
                Ok(_) => Err(WikiError::PageNotFound(NO_SUMMARY_FOUND.to_string())),
                Err(e) => {
                    warn!("Summary for search hit '{}' failed: {}", first, e);
                    Err(WikiError::PageNotFound(NO_SUMMARY_FOUND.to_string()))
                }
            }
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockKnowledgeSource;

    #[tokio::test]
    async fn test_direct_hit_has_no_resolved_title() {
        let source = MockKnowledgeSource::new().with_article("Ohm's law", "Ohm's law states V = IR.");

        let lookup = lookup_summary(&source, "Ohm's law", 5, true).await.unwrap();
        assert_eq!(lookup.text, "Ohm's law states V = IR.");
        assert_eq!(lookup.resolved_title, None);
    }

    #[tokio::test]
    async fn test_missing_page_falls_back_to_search_hit() {
        let source = MockKnowledgeSource::new()
            .with_article("Cache (computing)", "A cache stores data.")
            .with_search_results("cache memory", vec!["Cache (computing)"]);

        let lookup = lookup_summary(&source, "cache memory", 5, true).await.unwrap();
        assert_eq!(lookup.text, "A cache stores data.");
        assert_eq!(lookup.resolved_title.as_deref(), Some("Cache (computing)"));
    }

    #[tokio::test]
    async fn test_no_search_results_reports_no_page() {
        let source = MockKnowledgeSource::new();

        let err = lookup_summary(&source, "zzxqv", 5, true).await.unwrap_err();
        assert!(matches!(err, WikiError::PageNotFound(msg) if msg == NO_PAGE_FOUND));
    }

    #[tokio::test]
    async fn test_search_hit_without_summary_reports_no_summary() {
        let source =
            MockKnowledgeSource::new().with_search_results("flux", vec!["Flux (missing)"]);

        let err = lookup_summary(&source, "flux", 5, true).await.unwrap_err();
        assert!(matches!(err, WikiError::PageNotFound(msg) if msg == NO_SUMMARY_FOUND));
    }

    #[tokio::test]
    async fn test_blank_extract_reports_no_summary() {
        let source = MockKnowledgeSource::new().with_article("Stub", " \n");

        let err = lookup_summary(&source, "Stub", 5, true).await.unwrap_err();
        assert!(matches!(err, WikiError::PageNotFound(msg) if msg == NO_SUMMARY_FOUND));
    }

    #[tokio::test]
    async fn test_disambiguation_is_not_retried() {
        let source = MockKnowledgeSource::new().with_disambiguation(
            "Mercury",
            vec!["Mercury (planet)", "Mercury (element)"],
        );

        let err = lookup_summary(&source, "Mercury", 5, true).await.unwrap_err();
        match err {
            WikiError::Disambiguation { options, .. } => assert_eq!(options.len(), 2),
            other => panic!("expected disambiguation, got {other:?}"),
        }
    }
}
