//! The Route stage (spec §4.1 node 2): ask the generative model which
//! registered tool should handle this request. Grounded in the same
//! JSON-contract-plus-robust-extractor pattern
//! [`paathshala_quality::evaluate`] uses, generalized from scoring to
//! tool selection.

use paathshala_json::extract;
use paathshala_provider::{CompletionRequest, GenerativeProvider};
use paathshala_tool::ToolRegistry;
use paathshala_types::Message;
use serde::Deserialize;

/// The tool the engine falls back to when routing can't be parsed at
/// all (spec §4.1 node 2: "the stage yields a default tool").
pub const DEFAULT_TOOL: &str = "activity_generator";

/// Confidence assigned to the parse-failure fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Reason string attached to the parse-failure fallback.
pub const FALLBACK_REASON: &str = "fallback";

/// The router model's parsed decision.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDecision {
    /// Name of the tool to invoke.
    pub selected_tool: String,
    /// Why the router picked it.
    pub reason: String,
    /// The query, distilled to the topic the tool should act on.
    pub extracted_topic: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl RouteDecision {
    fn fallback(query: &str) -> Self {
        Self {
            selected_tool: DEFAULT_TOOL.into(),
            reason: FALLBACK_REASON.into(),
            extracted_topic: query.to_string(),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

fn system_prompt(registry: &ToolRegistry) -> String {
    let tools = registry
        .descriptors()
        .map(|d| format!("- {}: {}", d.name.as_str(), d.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the router for a classroom-assistant system. Given a teacher's message and the \
recent conversation, choose exactly one tool from this registry:\n{tools}\n\n\
Reply with JSON only, no prose, in this exact shape:\n\
{{\"selected_tool\": \"...\", \"reason\": \"...\", \"extracted_topic\": \"...\", \"confidence\": 0.0}}"
    )
}

fn conversation_tail(recent: &[Message]) -> String {
    recent
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask the model to route `query` against `registry`. Never fails: a
/// parse or model failure yields [`RouteDecision::fallback`] per spec
/// §4.1 node 2.
pub async fn route(
    provider: &dyn GenerativeProvider,
    registry: &ToolRegistry,
    query: &str,
    recent_history: &[Message],
) -> RouteDecision {
    let system = system_prompt(registry);
    let user = format!(
        "Recent conversation:\n{}\n\nTeacher's message: {query}",
        conversation_tail(recent_history)
    );
    let request = CompletionRequest::single_turn(system, user);

    let response = match provider.complete(request).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "route model call failed, using fallback tool");
            return RouteDecision::fallback(query);
        }
    };

    match extract::<RouteDecision>(&response.text) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(error = %e, "route response did not parse, using fallback tool");
            RouteDecision::fallback(query)
        }
    }
}
