//! MediaWiki action API client

use super::{KnowledgeSource, SearchResults, WikiError, WikiPage};
use crate::config::WikipediaSection;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, Instrument};

/// Wikipedia client backed by `/w/api.php`
pub struct WikipediaClient {
    api_url: String,
    client: Client,
}

impl WikipediaClient {
    pub fn new(config: &WikipediaSection) -> Result<Self, WikiError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WikiError::Http(e.to_string()))?;

        Ok(Self {
            api_url: config.api_url.clone(),
            client,
        })
    }

    /// Issue one `action=query` call and decode the `query` member
    async fn query<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T, WikiError> {
        let mut query: Vec<(&str, String)> = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        query.extend(params.iter().cloned());

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WikiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiError::Api(format!("{status} - {body}")));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| WikiError::InvalidResponse(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(WikiError::Api(format!("{}: {}", error.code, error.info)));
        }

        envelope
            .query
            .ok_or_else(|| WikiError::InvalidResponse("response has no query member".to_string()))
    }

    /// Apply auto-suggestion: prefer the engine's suggestion, then the top hit
    async fn resolve_title(&self, query: &str, auto_suggest: bool) -> Result<String, WikiError> {
        if !auto_suggest {
            return Ok(query.to_string());
        }

        let results = self.search(query, 1).await?;
        results
            .suggestion
            .or_else(|| results.titles.into_iter().next())
            .ok_or_else(|| {
                WikiError::PageNotFound(format!("Page id \"{query}\" does not match any pages"))
            })
    }

    async fn disambiguation_options(&self, title: &str) -> Result<Vec<String>, WikiError> {
        let query: PagesQuery<LinkedPage> = self
            .query(&[
                ("prop", "links".to_string()),
                ("plnamespace", "0".to_string()),
                ("pllimit", "max".to_string()),
                ("titles", title.to_string()),
            ])
            .await?;

        Ok(query
            .pages
            .into_iter()
            .flat_map(|page| page.links)
            .map(|link| link.title)
            .collect())
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn search(&self, query: &str, limit: u32) -> Result<SearchResults, WikiError> {
        let span = crate::fetch_span!(op = "search", query = %query);
        async {
            let result: SearchQuery = self
                .query(&[
                    ("list", "search".to_string()),
                    ("srsearch", query.to_string()),
                    ("srlimit", limit.to_string()),
                    ("srinfo", "suggestion".to_string()),
                    ("srprop", String::new()),
                ])
                .await?;

            debug!("Search returned {} titles", result.search.len());
            Ok::<_, WikiError>(SearchResults {
                titles: result.search.into_iter().map(|hit| hit.title).collect(),
                suggestion: result
                    .searchinfo
                    .and_then(|info| info.suggestion)
                    .filter(|s| !s.is_empty()),
            })
        }
        .instrument(span)
        .await
    }

    async fn page(&self, query: &str, auto_suggest: bool) -> Result<WikiPage, WikiError> {
        let span = crate::fetch_span!(op = "page", query = %query, auto_suggest);
        async {
            let title = self.resolve_title(query, auto_suggest).await?;

            let result: PagesQuery<InfoPage> = self
                .query(&[
                    ("prop", "info|pageprops".to_string()),
                    ("inprop", "url".to_string()),
                    ("ppprop", "disambiguation".to_string()),
                    ("redirects", "1".to_string()),
                    ("titles", title.clone()),
                ])
                .await?;

            let page = result.pages.into_iter().next().ok_or_else(|| {
                WikiError::InvalidResponse("query returned no pages".to_string())
            })?;

            if page.missing || page.invalid {
                return Err(WikiError::PageNotFound(format!(
                    "Page id \"{title}\" does not match any pages"
                )));
            }

            if page
                .pageprops
                .as_ref()
                .is_some_and(|props| props.disambiguation.is_some())
            {
                let options = self.disambiguation_options(&page.title).await?;
                return Err(WikiError::Disambiguation {
                    title: page.title,
                    options,
                });
            }

            match (page.pageid, page.fullurl) {
                (Some(page_id), Some(url)) => Ok(WikiPage {
                    title: page.title,
                    page_id,
                    url,
                }),
                _ => Err(WikiError::InvalidResponse(format!(
                    "page \"{}\" is missing id or url",
                    page.title
                ))),
            }
        }
        .instrument(span)
        .await
    }

    async fn summary(
        &self,
        query: &str,
        sentences: u32,
        auto_suggest: bool,
    ) -> Result<String, WikiError> {
        let page = self.page(query, auto_suggest).await?;

        let span = crate::fetch_span!(op = "summary", title = %page.title, sentences);
        async {
            let result: PagesQuery<ExtractPage> = self
                .query(&[
                    ("prop", "extracts".to_string()),
                    ("explaintext", "1".to_string()),
                    ("exintro", "1".to_string()),
                    ("exsentences", sentences.to_string()),
                    ("pageids", page.page_id.to_string()),
                ])
                .await?;

            Ok::<_, WikiError>(result
                .pages
                .into_iter()
                .next()
                .and_then(|p| p.extract)
                .unwrap_or_default()
                .trim()
                .to_string())
        }
        .instrument(span)
        .await
    }

    async fn page_html(&self, page: &WikiPage) -> Result<String, WikiError> {
        let span = crate::fetch_span!(op = "page_html", url = %page.url);
        async {
            let response = self
                .client
                .get(&page.url)
                .send()
                .await
                .map_err(|e| WikiError::Http(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(WikiError::Api(format!("{status} fetching {}", page.url)));
            }

            response
                .text()
                .await
                .map_err(|e| WikiError::Http(e.to_string()))
        }
        .instrument(span)
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    query: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery<P> {
    #[serde(default = "Vec::new")]
    pages: Vec<P>,
}

#[derive(Debug, Deserialize)]
struct InfoPage {
    title: String,
    pageid: Option<u64>,
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkedPage {
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}
