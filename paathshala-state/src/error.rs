//! Storage-specific error type. Converts into [`paathshala_types::EngineError`]
//! at the engine boundary.

use thiserror::Error;

/// Errors from a [`crate::ConversationStore`] implementation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A write could not be completed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A read could not be completed.
    #[error("read failed: {0}")]
    ReadFailed(String),
}

impl From<StoreError> for paathshala_types::EngineError {
    fn from(e: StoreError) -> Self {
        paathshala_types::EngineError::StorageFailed(e.to_string())
    }
}
