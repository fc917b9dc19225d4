//! LLM provider abstraction layer
//!
//! Chat completion is used to write the three-panel comic script. The provider
//! trait keeps the story writer testable without a network.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
