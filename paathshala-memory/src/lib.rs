#![deny(missing_docs)]
//! Conversation memory: a bounded hot cache in front of durable storage,
//! plus threshold-triggered summarization (spec §4.2).

mod hot_cache;
mod summarize;

pub use hot_cache::HotCache;
pub use summarize::{maybe_compact, SummarizerConfig};
