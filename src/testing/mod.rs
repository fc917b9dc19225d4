//! Testing utilities and mock implementations
//!
//! In-process stand-ins for Wikipedia and the three model services, so the
//! pipeline and HTTP routes can be tested without network access.

pub mod mocks;

pub use mocks::*;
