//! Structured logging on `tracing`
//!
//! Output format and level come from the environment:
//!
//! - `LOG_LEVEL`: ERROR, WARN, INFO (default), DEBUG or TRACE
//! - `LOG_FORMAT`: `json` (default), `pretty` or `compact`
//! - `LOG_SPANS`: `true` to log span open/close events
//! - `RUST_LOG`: replaces the computed filter entirely
//!
//! ```bash
//! LOG_FORMAT=pretty LOG_LEVEL=DEBUG ./edutoon serve
//! ```
//!
//! Three span macros tag the stages of a concept request: [`request_span!`]
//! for the browser call, [`fetch_span!`] for Wikipedia, and
//! [`generation_span!`] for the summary, story and image models.

use std::env;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line with colors
    Pretty,
    /// Single line with colors, no targets
    Compact,
}

impl LogFormat {
    /// Unknown values fall back to JSON
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Dependencies whose output is capped at WARN
const NOISY_TARGETS: [&str; 6] = ["hyper", "reqwest", "warp", "html5ever", "selectors", "tokio"];

fn default_filter(level: Level) -> EnvFilter {
    NOISY_TARGETS
        .iter()
        .filter_map(|target| format!("{target}=warn").parse::<Directive>().ok())
        .fold(EnvFilter::new(level.to_string()), EnvFilter::add_directive)
}

fn span_events(include_spans: bool) -> FmtSpan {
    if include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Install the global subscriber
///
/// Output goes to stderr so `edutoon explain` can print JSON on stdout.
pub fn init_logging(level: Level, format: LogFormat, include_spans: bool) {
    let filter = env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| default_filter(level));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(span_events(include_spans));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(base.json()).init(),
        LogFormat::Pretty => registry.with(base.pretty().with_ansi(true)).init(),
        LogFormat::Compact => registry
            .with(base.compact().with_ansi(true).with_target(false))
            .init(),
    }
}

/// Parse a `LOG_LEVEL` value, defaulting to INFO
pub fn parse_level(s: &str) -> Level {
    s.trim().parse().unwrap_or(Level::INFO)
}

/// Level selected by repeated `-v` flags; `None` defers to `LOG_LEVEL`
pub fn level_for_verbosity(verbose: u8) -> Option<Level> {
    match verbose {
        0 => None,
        1 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

fn spans_enabled(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Initialize logging from environment variables, raised by CLI verbosity
pub fn init_logging_with_verbosity(verbose: u8) {
    let level = level_for_verbosity(verbose)
        .unwrap_or_else(|| parse_level(&env::var("LOG_LEVEL").unwrap_or_default()));
    let format = LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default());
    let include_spans = spans_enabled(&env::var("LOG_SPANS").unwrap_or_default());

    init_logging(level, format, include_spans);
}

/// Span for one browser request
#[macro_export]
macro_rules! request_span {
    ($($field:tt)*) => {
        tracing::info_span!("request", $($field)*)
    };
}

/// Span for a Wikipedia call
#[macro_export]
macro_rules! fetch_span {
    ($($field:tt)*) => {
        tracing::info_span!("wikipedia_fetch", $($field)*)
    };
}

/// Span around a model-backed generation step
#[macro_export]
macro_rules! generation_span {
    ($($field:tt)*) => {
        tracing::info_span!("generation", $($field)*)
    };
}

pub use {fetch_span, generation_span, request_span};
