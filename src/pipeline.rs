//! Request orchestration
//!
//! `EduToon` ties the seams together. An explanation is the Wikipedia summary,
//! its condensed form, formulas and a longer digest. A comic is a generated
//! three-panel script with art for each panel.

use crate::config::AppConfig;
use crate::error::{sanitize_error_message, EduToonError, EduToonResult};
use crate::formula::choose_formulas;
use crate::imagegen::{
    render_fallback_panel, CachedImageGenerator, GeneratedImage, ImageGenerator, ImageStore,
    StabilityConfig, StabilityImageGenerator, UnconfiguredImageGenerator,
};
use crate::llm::{LlmProvider, OpenAiConfig, OpenAiProvider, UnconfiguredProvider};
use crate::scrape::{page_content_for, Formula};
use crate::story::{image_prompt, split_story_to_panels, StoryOptions, StoryWriter};
use crate::summarize::{
    HuggingFaceConfig, HuggingFaceSummarizer, PassthroughSummarizer, Summarizer, SummaryParams,
};
use crate::wiki::{lookup_summary, KnowledgeSource, WikipediaClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Result of explaining a concept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub concept: String,
    /// Search hit used when the concept itself has no article
    pub resolved_title: Option<String>,
    /// "Showing results for: ..." when `resolved_title` is set
    pub notice: Option<String>,
    pub summary: String,
    pub formulas: Vec<Formula>,
    pub details: String,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// One comic panel; the image is fetched separately by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub index: usize,
    pub text: String,
    pub prompt: String,
    pub image_id: Uuid,
    pub image_mime: String,
    /// False when the image is the rendered text card
    pub generated: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comic {
    pub concept: String,
    pub story: String,
    pub fallback_story: bool,
    pub panels: Vec<Panel>,
}

/// Names of the active implementation behind each seam
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamStatus {
    pub summarizer: String,
    pub llm: String,
    pub images: String,
}

/// Tunables taken from configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub summary_sentences: u32,
    pub auto_suggest: bool,
    pub summary_params: SummaryParams,
    pub story: StoryOptions,
    pub request_spacing: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub image_store_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            summary_sentences: config.wikipedia.summary_sentences,
            auto_suggest: config.wikipedia.auto_suggest,
            summary_params: SummaryParams {
                max_length: config.summarizer.max_length,
                min_length: config.summarizer.min_length,
                do_sample: config.summarizer.do_sample,
            },
            story: StoryOptions {
                model: config.llm.model.clone(),
                system_prompt: config.llm.system_prompt.clone(),
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
            request_spacing: Duration::from_millis(config.images.request_spacing_ms),
            cache_capacity: config.cache.capacity,
            cache_ttl: config.cache.ttl(),
            image_store_capacity: config.cache.image_store_capacity,
        }
    }
}

/// The implementations behind each seam
pub struct Upstreams {
    pub knowledge: Arc<dyn KnowledgeSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub llm: Arc<dyn LlmProvider>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Upstreams {
    /// Build production clients, degrading seams whose keys are missing
    pub fn from_config(config: &AppConfig) -> EduToonResult<Self> {
        let knowledge: Arc<dyn KnowledgeSource> =
            Arc::new(WikipediaClient::new(&config.wikipedia)?);

        let summarizer: Arc<dyn Summarizer> = match config.get_summarizer_api_key() {
            Some(api_token) => Arc::new(HuggingFaceSummarizer::new(HuggingFaceConfig {
                api_token,
                api_url: config.summarizer.api_url.clone(),
                model: config.summarizer.model.clone(),
                timeout: Duration::from_secs(config.summarizer.timeout_secs),
            })?),
            None => {
                warn!(
                    "{} not set, summaries fall back to leading Wikipedia sentences",
                    config.summarizer.api_key_env
                );
                Arc::new(PassthroughSummarizer::new())
            }
        };

        let llm: Arc<dyn LlmProvider> = match config.get_llm_api_key() {
            Ok(api_key) => Arc::new(OpenAiProvider::new(OpenAiConfig {
                api_key,
                base_url: config.llm.base_url.clone(),
                timeout: Duration::from_secs(config.llm.timeout_secs),
            })?),
            Err(e) => {
                warn!("Chat completion disabled, using the canned story: {}", e);
                Arc::new(UnconfiguredProvider::new(e.to_string()))
            }
        };

        let images: Arc<dyn ImageGenerator> = match config.get_images_api_key() {
            Ok(api_key) => {
                let stability = StabilityImageGenerator::new(StabilityConfig {
                    api_key,
                    base_url: config.images.base_url.clone(),
                    endpoint: config.images.endpoint.clone(),
                    output_format: config.images.output_format.clone(),
                    timeout: Duration::from_secs(config.images.timeout_secs),
                })?;
                Arc::new(CachedImageGenerator::new(
                    Arc::new(stability),
                    config.cache.capacity,
                    config.cache.ttl(),
                ))
            }
            Err(e) => {
                warn!("Image generation disabled, panels use text cards: {}", e);
                Arc::new(UnconfiguredImageGenerator::new(e.to_string()))
            }
        };

        Ok(Self {
            knowledge,
            summarizer,
            llm,
            images,
        })
    }
}

/// Concept explainer and comic maker
pub struct EduToon {
    knowledge: Arc<dyn KnowledgeSource>,
    summarizer: Arc<dyn Summarizer>,
    images: Arc<dyn ImageGenerator>,
    story_writer: StoryWriter,
    image_store: ImageStore,
    settings: PipelineSettings,
    status: UpstreamStatus,
}

impl EduToon {
    pub fn new(upstreams: Upstreams, settings: PipelineSettings) -> Self {
        let status = UpstreamStatus {
            summarizer: upstreams.summarizer.name().to_string(),
            llm: upstreams.llm.name().to_string(),
            images: upstreams.images.name().to_string(),
        };

        let story_writer = StoryWriter::new(
            upstreams.llm,
            settings.story.clone(),
            settings.cache_capacity,
            settings.cache_ttl,
        );

        Self {
            knowledge: upstreams.knowledge,
            summarizer: upstreams.summarizer,
            images: upstreams.images,
            story_writer,
            image_store: ImageStore::new(settings.image_store_capacity),
            settings,
            status,
        }
    }

    pub fn from_config(config: &AppConfig) -> EduToonResult<Self> {
        Ok(Self::new(
            Upstreams::from_config(config)?,
            PipelineSettings::from_config(config),
        ))
    }

    pub fn upstream_status(&self) -> &UpstreamStatus {
        &self.status
    }

    /// Wikipedia summary, condensed explanation, formulas and details for `concept`
    pub async fn explain(&self, concept: &str) -> EduToonResult<Explanation> {
        let concept = normalize_concept(concept)?;
        let span = crate::request_span!(op = "explain", concept = %concept);

        self.build_explanation(concept).instrument(span).await
    }

    async fn build_explanation(&self, concept: String) -> EduToonResult<Explanation> {
        let lookup = lookup_summary(
            self.knowledge.as_ref(),
            &concept,
            self.settings.summary_sentences,
            self.settings.auto_suggest,
        )
        .await?;

        let mut warnings = Vec::new();
        let summary = match self
            .summarizer
            .summarize(&lookup.text, self.settings.summary_params)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summarizer failed, using Wikipedia text: {}", e);
                warnings.push(sanitize_error_message(&format!(
                    "Summary model unavailable, showing the Wikipedia text instead ({e})"
                )));
                lookup.text.clone()
            }
        };

        let article = lookup.resolved_title.as_deref().unwrap_or(&concept);
        let content =
            page_content_for(self.knowledge.as_ref(), article, self.settings.auto_suggest).await;

        let formulas = choose_formulas(content.formulas, &lookup.text, &summary);
        let details = if content.details.is_empty() {
            lookup.text.clone()
        } else {
            content.details
        };

        info!(
            "Explained '{}': {} formulas, {} warnings",
            concept,
            formulas.len(),
            warnings.len()
        );

        Ok(Explanation {
            notice: lookup
                .resolved_title
                .as_ref()
                .map(|title| format!("Showing results for: {title}")),
            resolved_title: lookup.resolved_title,
            concept,
            summary,
            formulas,
            details,
            warnings,
            generated_at: Utc::now(),
        })
    }

    /// Three-panel comic for `concept`; panels whose art fails get a text card
    pub async fn comic(&self, concept: &str) -> EduToonResult<Comic> {
        let concept = normalize_concept(concept)?;
        let span = crate::request_span!(op = "comic", concept = %concept);

        self.build_comic(concept).instrument(span).await
    }

    async fn build_comic(&self, concept: String) -> EduToonResult<Comic> {
        let story = self.story_writer.comic_story(&concept).await;
        let mut panels = Vec::new();

        for (offset, text) in split_story_to_panels(&story.text).into_iter().enumerate() {
            if offset > 0 && !self.settings.request_spacing.is_zero() {
                tokio::time::sleep(self.settings.request_spacing).await;
            }
            panels.push(self.render_panel(offset + 1, text).await);
        }

        Ok(Comic {
            concept,
            story: story.text,
            fallback_story: story.fallback,
            panels,
        })
    }

    async fn render_panel(&self, index: usize, text: String) -> Panel {
        let prompt = image_prompt(&text);

        let (image, generated, error) = match self.images.generate(&prompt).await {
            Ok(image) => (image, true, None),
            Err(e) => {
                warn!("Panel {} image failed: {}", index, e);
                (
                    render_fallback_panel(&text),
                    false,
                    Some(sanitize_error_message(&e.to_string())),
                )
            }
        };

        let image_mime = image.mime.clone();
        let image_id = self.image_store.put(image).await;

        Panel {
            index,
            text,
            prompt,
            image_id,
            image_mime,
            generated,
            error,
        }
    }

    pub async fn image(&self, id: &Uuid) -> EduToonResult<GeneratedImage> {
        self.image_store
            .get(id)
            .await
            .ok_or_else(|| EduToonError::not_found(format!("No image with id {id}")))
    }
}

/// Trim surrounding whitespace; blank concepts are rejected
pub fn normalize_concept(concept: &str) -> EduToonResult<String> {
    let trimmed = concept.trim();
    if trimmed.is_empty() {
        return Err(EduToonError::invalid_input("Enter a concept to explain"));
    }
    Ok(trimmed.to_string())
}
