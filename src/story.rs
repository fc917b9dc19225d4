//! Comic script generation and panel handling
//!
//! A chat model writes a three-panel script for the concept. The script is split
//! into panels and each panel is reduced to a short image prompt.

use crate::cache::TtlCache;
use crate::llm::{CompletionRequest, LlmProvider, Message};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn, Instrument};

pub const PANEL_COUNT: usize = 3;

/// Script shown when the model cannot be reached
pub const FALLBACK_STORY: &str = "Panel 1: A squirrel discovers Ohm's Law in the forest!\n\
Panel 2: He builds a tiny circuit to power his nut vault.\n\
Panel 3: Now he's the smartest squirrel in the woods!";

pub const PLACEHOLDER_PANEL: &str = "A fun comic panel about this concept!";

const GENERIC_PANEL_PROMPT: &str = "educational comic panel about science";

/// Panel bodies at or below this many characters are discarded
const MIN_PANEL_LEN: usize = 6;
const MIN_PROMPT_LEN: usize = 10;
const MAX_PROMPT_LEN: usize = 200;

static PANEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    (1..=PANEL_COUNT)
        .map(|i| {
            Regex::new(&format!(r"(?si)Panel {i}:(.*?)(Panel {}:|$)", i + 1))
                .expect("valid regex")
        })
        .collect()
});

static DIALOGUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)Dialogue:.*?$").expect("valid regex"));

/// Generated script and whether it is the canned fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicStory {
    pub text: String,
    pub fallback: bool,
}

/// Settings for story completion requests
#[derive(Debug, Clone)]
pub struct StoryOptions {
    pub model: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            model: "mistralai/Mistral-7B-Instruct-v0.1".to_string(),
            system_prompt: "You're a comic creator for kids, making engineering concepts fun."
                .to_string(),
            temperature: Some(0.7),
            max_tokens: Some(300),
        }
    }
}

/// Writes comic scripts through an [`LlmProvider`], caching them per concept
pub struct StoryWriter {
    provider: Arc<dyn LlmProvider>,
    options: StoryOptions,
    cache: TtlCache<String, ComicStory>,
}

impl StoryWriter {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        options: StoryOptions,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            options,
            cache: TtlCache::new(capacity, ttl),
        }
    }

    /// Script for `concept`; never fails, degrading to [`FALLBACK_STORY`]
    ///
    /// Fallback scripts are not cached so the next request tries the model again.
    pub async fn comic_story(&self, concept: &str) -> ComicStory {
        let key = concept.to_string();
        if let Some(story) = self.cache.get(&key).await {
            debug!("Story cache hit for '{}'", concept);
            return story;
        }

        let span = crate::generation_span!(
            stage = "story",
            provider = self.provider.name(),
            model = %self.options.model
        );

        match self.request_story(concept).instrument(span).await {
            Ok(text) => {
                let story = ComicStory {
                    text,
                    fallback: false,
                };
                self.cache.insert(key, story.clone()).await;
                story
            }
            Err(reason) => {
                warn!("Story generation for '{}' failed: {}", concept, reason);
                ComicStory {
                    text: FALLBACK_STORY.to_string(),
                    fallback: true,
                }
            }
        }
    }

    async fn request_story(&self, concept: &str) -> Result<String, String> {
        let request = CompletionRequest {
            messages: vec![
                Message::system(self.options.system_prompt.clone()),
                Message::user(story_prompt(concept)),
            ],
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| e.to_string())?;

        response
            .content
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| "model returned no content".to_string())
    }
}

/// User prompt asking for a three-panel script about `concept`
pub fn story_prompt(concept: &str) -> String {
    format!(
        "Create a 3-panel fun, creative, and educational comic to explain the concept '{concept}' \
to a 12-year-old. Be silly but informative. Each panel should be short and visual.\n\n\
Format:\nPanel 1: [description]\nPanel 2: [description]\nPanel 3: [description]"
    )
}

/// Split a script into exactly three panel texts
///
/// Panels that are missing or too short are dropped and the list is padded with
/// [`PLACEHOLDER_PANEL`], so a found panel may shift to an earlier slot.
pub fn split_story_to_panels(story: &str) -> [String; PANEL_COUNT] {
    let mut panels: Vec<String> = PANEL_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.captures(story))
        .filter_map(|captures| captures.get(1))
        .map(|body| body.as_str().trim().replace('\n', " "))
        .filter(|body| body.chars().count() > MIN_PANEL_LEN)
        .collect();

    panels.resize(PANEL_COUNT, PLACEHOLDER_PANEL.to_string());

    let mut slots = panels.into_iter();
    std::array::from_fn(|_| slots.next().unwrap_or_default())
}

/// Strip script markup from a panel and bound its length for image prompting
pub fn simplify_panel_text(panel: &str) -> String {
    let without_dialogue = DIALOGUE_LINE.replace_all(panel, "");
    let clean = without_dialogue.replace("Scene:", "");
    let clean = clean.trim();

    if clean.chars().count() < MIN_PROMPT_LEN {
        return GENERIC_PANEL_PROMPT.to_string();
    }

    clean.chars().take(MAX_PROMPT_LEN).collect()
}

pub fn image_prompt(panel: &str) -> String {
    format!(
        "Educational comic panel: {}, cartoon style, colorful, clear illustration",
        simplify_panel_text(panel)
    )
}
