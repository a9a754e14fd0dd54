//! Quarry — a lightweight research-assistant toolkit.
//!
//! Caches lookup responses to disk, persists user-tunable configuration,
//! supplies canned multi-step query templates for research domains, and
//! wraps third-party lookup services (encyclopedia, web search, news,
//! academic papers, raw page fetch) behind a uniform [`tools::Tool`]
//! interface for consumption by an external LLM-driven agent loop.

pub mod cache;
pub mod config;
pub mod error;
pub mod templates;
pub mod tools;
pub mod utils;

pub use error::{QuarryError, Result};
