//! The error taxonomy the whole engine shares (spec §7).
//!
//! Every external-service failure is recovered at the stage that owns the
//! call — `EngineError` is what's left over when recovery isn't possible
//! or when a caller-facing boundary (input validation, cancellation) is
//! hit directly.

use thiserror::Error;

/// Errors surfaced to a caller of the engine, or used internally to
/// decide which fallback path a stage takes.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EngineError {
    /// The utterance was empty or exceeded the length limit.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// The generative or embedding model failed or timed out.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// A model response expected to be JSON could not be parsed into the
    /// declared shape, even after the robust extractor ran.
    #[error("parse failed: {0}")]
    ParseFailed(String),

    /// A tool's internal logic failed before it could construct a payload.
    #[error("tool failed: {tool}: {message}")]
    ToolFailed {
        /// Name of the tool that failed.
        tool: String,
        /// What went wrong.
        message: String,
    },

    /// The durable store could not complete a read or write.
    #[error("storage failed: {0}")]
    StorageFailed(String),

    /// The caller cancelled the request.
    #[error("cancelled")]
    Cancelled,
}

impl EngineError {
    /// `ParseFailed` is treated as `ModelUnavailable` for fallback purposes
    /// (spec §7): both recover by falling back to a default at the stage
    /// that made the call.
    pub fn is_model_unavailable_class(&self) -> bool {
        matches!(
            self,
            EngineError::ModelUnavailable(_) | EngineError::ParseFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display_includes_tool_and_message() {
        let e = EngineError::ToolFailed {
            tool: "activity_generator".into(),
            message: "timeout".into(),
        };
        assert_eq!(
            e.to_string(),
            "tool failed: activity_generator: timeout"
        );
    }

    #[test]
    fn model_unavailable_class_covers_parse_failed() {
        assert!(EngineError::ParseFailed("bad json".into()).is_model_unavailable_class());
        assert!(EngineError::ModelUnavailable("timeout".into()).is_model_unavailable_class());
        assert!(!EngineError::Cancelled.is_model_unavailable_class());
    }
}
