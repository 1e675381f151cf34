//! Provider traits the engine calls through.
//!
//! The same provider is called from several independent crates (the
//! summarizer, the quality gate, the router, retrieval's answer
//! synthesis) that all need to hold it as `Arc<dyn ...>`, so these
//! traits are `async-trait`-based rather than RPITIT — object safety
//! wins over a single generic caller here.

use crate::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from a model provider call.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, timeout).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The provider rate-limited this request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication with the provider failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// The provider's response didn't match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a stage may retry this call (spec §7: transient
    /// failures get one retry inside the stage that made the call).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::RequestFailed(_)
        )
    }
}

impl From<ProviderError> for paathshala_types::EngineError {
    fn from(e: ProviderError) -> Self {
        paathshala_types::EngineError::ModelUnavailable(e.to_string())
    }
}

/// A backend capable of serving text completions.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Run one completion request.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;
}

/// A backend capable of embedding text for retrieval (spec §4.7).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, preserving order. Callers are
    /// responsible for the `"query: "` / `"passage: "` prefixing
    /// convention (spec §4.7) — this trait just embeds whatever string
    /// it's given.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// The fixed dimensionality every embedding this provider returns
    /// will have.
    fn dimension(&self) -> usize;
}
