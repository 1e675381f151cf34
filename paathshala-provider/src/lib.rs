#![deny(missing_docs)]
//! Model provider traits and a Gemini-backed implementation.

mod gemini;
mod provider;
mod types;

pub use gemini::GeminiProvider;
pub use provider::{EmbeddingProvider, GenerativeProvider, ProviderError};
pub use types::{ChatMessage, CompletionRequest, CompletionResponse, Role, StopReason, TokenUsage};
