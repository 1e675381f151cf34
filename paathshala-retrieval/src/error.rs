//! Retrieval-specific errors, folded into [`paathshala_types::EngineError`]
//! at the boundary the same way every other external-service call in
//! this engine is.

use thiserror::Error;

/// Errors the retrieval engine can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding provider failed or timed out.
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    /// The generative provider failed while answering from context.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// A document or query embedding didn't match the corpus's declared
    /// dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the corpus expects (the embedding provider's declared
        /// dimension).
        expected: usize,
        /// Dimension actually produced.
        actual: usize,
    },
}

impl From<RetrievalError> for paathshala_types::EngineError {
    fn from(e: RetrievalError) -> Self {
        paathshala_types::EngineError::ModelUnavailable(e.to_string())
    }
}
