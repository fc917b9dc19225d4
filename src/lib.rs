//! EduToon - learn concepts through comics
//!
//! A small web tool that explains a concept from its Wikipedia article and turns
//! it into a three-panel comic.
//!
//! # Overview
//!
//! - Wikipedia retrieval with search fallback and disambiguation reporting
//! - HTML scraping of named formulas and a readable digest
//! - Summaries from a hosted summarization model
//! - Comic scripts from an OpenAI-compatible chat endpoint
//! - Panel art from a text-to-image service, with a rendered text fallback
//! - A warp server hosting the page and its JSON API
//!
//! # Quick Start
//!
//! ```rust
//! use edutoon::story::split_story_to_panels;
//!
//! let panels = split_story_to_panels(
//!     "Panel 1: A resistor naps.\nPanel 2: Current tiptoes past.\nPanel 3: Everyone cools down.",
//! );
//! assert_eq!(panels[1], "Current tiptoes past.");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod formula;
pub mod imagegen;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod scrape;
pub mod server;
pub mod story;
pub mod summarize;
pub mod testing;
pub mod wiki;

pub use config::*;
pub use error::{EduToonError, EduToonResult, ErrorBody, ErrorCode};
pub use pipeline::{Comic, EduToon, Explanation, Panel, PipelineSettings, Upstreams};
pub use scrape::Formula;
pub use story::ComicStory;
