//! Mock implementations for testing
//!
//! Provides mock KnowledgeSource, Summarizer, LlmProvider and ImageGenerator
//! implementations so the pipeline can be exercised without network access.

use crate::imagegen::{GeneratedImage, ImageError, ImageGenerator};
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};
use crate::summarize::{Summarizer, SummarizerError, SummaryParams};
use crate::wiki::{KnowledgeSource, SearchResults, WikiError, WikiPage};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Minimal PNG signature, enough for MIME sniffing
pub const MOCK_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

#[derive(Debug, Clone)]
struct MockArticle {
    summary: String,
    html: String,
}

/// In-memory Wikipedia stand-in keyed by exact title
#[derive(Debug, Default, Clone)]
pub struct MockKnowledgeSource {
    articles: HashMap<String, MockArticle>,
    disambiguations: HashMap<String, Vec<String>>,
    search_results: HashMap<String, Vec<String>>,
    pub should_fail: bool,
}

impl MockKnowledgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with an HTTP error
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn with_article(mut self, title: &str, summary: &str) -> Self {
        self.articles.insert(
            title.to_string(),
            MockArticle {
                summary: summary.to_string(),
                html: String::new(),
            },
        );
        self
    }

    /// Article with rendered HTML for the scraping path
    pub fn with_article_html(mut self, title: &str, summary: &str, html: &str) -> Self {
        self.articles.insert(
            title.to_string(),
            MockArticle {
                summary: summary.to_string(),
                html: html.to_string(),
            },
        );
        self
    }

    pub fn with_disambiguation(mut self, title: &str, options: Vec<&str>) -> Self {
        self.disambiguations.insert(
            title.to_string(),
            options.into_iter().map(str::to_string).collect(),
        );
        self
    }

    pub fn with_search_results(mut self, query: &str, titles: Vec<&str>) -> Self {
        self.search_results.insert(
            query.to_string(),
            titles.into_iter().map(str::to_string).collect(),
        );
        self
    }

    fn check_failure(&self) -> Result<(), WikiError> {
        if self.should_fail {
            Err(WikiError::Http("Mock Wikipedia failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn article(&self, title: &str) -> Result<&MockArticle, WikiError> {
        self.check_failure()?;

        if let Some(options) = self.disambiguations.get(title) {
            return Err(WikiError::Disambiguation {
                title: title.to_string(),
                options: options.clone(),
            });
        }

        self.articles
            .get(title)
            .ok_or_else(|| WikiError::PageNotFound(title.to_string()))
    }

    fn page_for(title: &str) -> WikiPage {
        WikiPage {
            title: title.to_string(),
            page_id: title.len() as u64,
            url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
        }
    }
}

#[async_trait]
impl KnowledgeSource for MockKnowledgeSource {
    async fn search(&self, query: &str, limit: u32) -> Result<SearchResults, WikiError> {
        self.check_failure()?;

        let titles = self
            .search_results
            .get(query)
            .map(|titles| titles.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default();

        Ok(SearchResults {
            titles,
            suggestion: None,
        })
    }

    async fn page(&self, query: &str, _auto_suggest: bool) -> Result<WikiPage, WikiError> {
        self.article(query)?;
        Ok(Self::page_for(query))
    }

    async fn summary(
        &self,
        query: &str,
        _sentences: u32,
        _auto_suggest: bool,
    ) -> Result<String, WikiError> {
        Ok(self.article(query)?.summary.clone())
    }

    async fn page_html(&self, page: &WikiPage) -> Result<String, WikiError> {
        Ok(self.article(&page.title)?.html.clone())
    }
}

/// Summarizer that returns a canned summary, or fails
#[derive(Debug, Default)]
pub struct MockSummarizer {
    pub summary: Option<String>,
    pub should_fail: bool,
    pub inputs: Arc<Mutex<Vec<String>>>,
}

impl MockSummarizer {
    /// Echo the input unchanged
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub async fn get_inputs(&self) -> Vec<String> {
        self.inputs.lock().await.clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn summarize(
        &self,
        text: &str,
        _params: SummaryParams,
    ) -> Result<String, SummarizerError> {
        self.inputs.lock().await.push(text.to_string());

        if self.should_fail {
            return Err(SummarizerError::ApiError("Mock summarizer failure".to_string()));
        }

        Ok(self.summary.clone().unwrap_or_else(|| text.to_string()))
    }
}

/// Mock LLM provider for testing
#[derive(Debug)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub should_fail: bool,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            should_fail: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    pub async fn get_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::ApiError("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }
}

/// Image generator returning a tiny PNG and recording prompts
#[derive(Debug, Default)]
pub struct MockImageGenerator {
    pub should_fail: bool,
    /// Prompts containing this substring fail
    pub fail_on: Option<String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn failing_on(fragment: impl Into<String>) -> Self {
        Self {
            fail_on: Some(fragment.into()),
            ..Default::default()
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        self.prompts.lock().await.push(prompt.to_string());

        let matches_fragment = self
            .fail_on
            .as_deref()
            .is_some_and(|fragment| prompt.contains(fragment));

        if self.should_fail || matches_fragment {
            return Err(ImageError::Api {
                status: 402,
                body: serde_json::json!({"errors": ["Mock image failure"]}),
            });
        }

        Ok(GeneratedImage {
            bytes: Bytes::from_static(MOCK_PNG),
            mime: "image/png".to_string(),
        })
    }
}
