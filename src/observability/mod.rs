//! Observability for EduToon
//!
//! Structured logging with span macros for the request, fetch and generation
//! stages of the pipeline.

pub mod logging;

pub use logging::{
    LogFormat, init_logging, init_logging_with_verbosity, level_for_verbosity,
    parse_level,
};

// Span macros for structured logging
pub use logging::{fetch_span, generation_span, request_span};
