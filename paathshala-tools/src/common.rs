//! Shared model-call-then-extract plumbing used by every tool in this
//! crate. Mirrors the fence-stripped, JSON-only prompting the Python
//! prototype's tools used (`"Return ONLY valid JSON, no other text."`),
//! routed through `paathshala-json`'s extractor rather than the
//! prototype's inline regex fallback.

use paathshala_provider::{CompletionRequest, GenerativeProvider};
use paathshala_tool::ToolError;
use serde::de::DeserializeOwned;

/// Run one model call and extract a `T` from its response.
pub(crate) async fn call_model_for_json<T: DeserializeOwned>(
    provider: &dyn GenerativeProvider,
    system: &str,
    user: String,
) -> Result<T, ToolError> {
    let request = CompletionRequest::single_turn(system, user);
    let response = provider
        .complete(request)
        .await
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

    paathshala_json::extract(&response.text)
        .map_err(|e| ToolError::ExecutionFailed(format!("could not parse model output: {e}")))
}

/// Render structured context as a compact JSON blob for the prompt, or
/// `"{}"` if it's empty.
pub(crate) fn context_blob(context: &std::collections::HashMap<String, serde_json::Value>) -> String {
    if context.is_empty() {
        "{}".to_string()
    } else {
        serde_json::to_string(context).unwrap_or_else(|_| "{}".to_string())
    }
}
