//! The data model (spec §3): Utterance, Session, Message, Pipeline State,
//! Tool Descriptor, Corpus Document.

use crate::id::{SessionId, ToolName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest utterance text the engine accepts, inclusive.
pub const MAX_UTTERANCE_CHARS: usize = 1000;

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A teacher's message.
    User,
    /// The engine's reply.
    Assistant,
    /// A compacted summary or other engine-internal annotation.
    System,
}

/// The raw inbound request. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Non-empty, at most [`MAX_UTTERANCE_CHARS`] characters.
    pub text: String,
    /// Opaque session identifier. Minted by the caller or by the engine.
    pub session_id: Option<SessionId>,
    /// Recognized structured context keys: grade, subject, class_size,
    /// language. Anything else is passed through untouched.
    pub structured_context: HashMap<String, serde_json::Value>,
    /// When the utterance was captured, ISO-8601 UTC.
    pub capture_time: chrono::DateTime<chrono::Utc>,
}

impl Utterance {
    /// Validate length and non-emptiness (spec §3, §8 boundary cases).
    pub fn validate(&self) -> Result<(), crate::error::EngineError> {
        if self.text.is_empty() {
            return Err(crate::error::EngineError::InputInvalid(
                "utterance text is empty".into(),
            ));
        }
        if self.text.chars().count() > MAX_UTTERANCE_CHARS {
            return Err(crate::error::EngineError::InputInvalid(format!(
                "utterance text exceeds {MAX_UTTERANCE_CHARS} characters"
            )));
        }
        Ok(())
    }
}

/// A conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier.
    pub id: SessionId,
    /// When the session was first created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the session was last touched.
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Free-form metadata, empty by default.
    pub metadata: serde_json::Value,
}

impl Session {
    /// Create a new session starting now.
    pub fn new(id: SessionId, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            metadata: serde_json::Value::Object(Default::default()),
        }
    }
}

/// One turn in a session. Append-only; sequence is strictly increasing
/// and contiguous on retrieval within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// Strictly increasing, contiguous per session.
    pub monotonic_sequence: u64,
    /// Who produced this message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the message was captured.
    pub capture_time: chrono::DateTime<chrono::Utc>,
    /// Opaque metadata, e.g. which tool produced an assistant message.
    pub metadata: serde_json::Value,
}

/// Sentinel prefix marking a `system`-role message as a compacted summary
/// of an older prefix of the conversation (spec §3, §4.2).
pub const SUMMARY_SENTINEL: &str = "[summary]";

impl Message {
    /// Whether this message is a compaction summary rather than an
    /// ordinary system message.
    pub fn is_summary(&self) -> bool {
        self.role == Role::System && self.content.starts_with(SUMMARY_SENTINEL)
    }
}

/// The fixed set of stages in the request graph (spec §4.1). Modeled as a
/// sum type rather than free-form stage names, per the redesign flag that
/// calls for a fixed graph value instead of a runtime-constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Resolve/hydrate the session and append the new utterance.
    LoadContext,
    /// Ask the model which tool to use.
    Route,
    /// Accept, retry, or terminate based on route confidence.
    ConfidenceGate,
    /// Invoke the selected tool.
    Execute,
    /// Check the tool's output matches its declared shape.
    ValidateStructure,
    /// Score the output and decide whether to regenerate.
    QualityGate,
    /// Invoke a chained tool if the primary tool's descriptor calls for it.
    FollowUp,
    /// Stamp timing and persist the final exchange.
    Finalize,
}

/// The mutable record that flows through the graph for one request
/// (spec §3). Created at request entry, mutated by each stage, consumed
/// to produce the response, then discarded — never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    // inputs
    /// The query to route and execute against (post language front-end).
    pub query: String,
    /// Session this request belongs to.
    pub session_id: SessionId,
    /// Structured context passed through from the utterance.
    pub structured_context: HashMap<String, serde_json::Value>,
    /// Language detected by the front-end.
    pub source_language: String,

    // routing
    /// Tool selected by Route, if any.
    pub selected_tool: Option<ToolName>,
    /// Why that tool was selected.
    pub routing_reason: String,
    /// Confidence in the tool selection, in `[0, 1]`.
    pub route_confidence: f64,
    /// How many times Route has run for this request.
    pub routing_attempts: u32,

    // tool output / quality
    /// How many times Execute has run for this request (quality retries).
    pub quality_attempts: u32,
    /// Raw tool error, if Execute or ValidateStructure failed.
    pub tool_error: Option<String>,
    /// Quality score of the current result, in `[0, 1]`.
    pub quality_score: Option<f64>,
    /// Whether the quality gate demanded regeneration.
    pub quality_needs_redo: bool,
    /// Free-text notes from the quality gate.
    pub validation_notes: Vec<String>,

    // follow-up
    /// Whether a follow-up invocation was deemed warranted.
    pub needs_follow_up: bool,
    /// Which tool the follow-up should invoke.
    pub follow_up_tool: Option<ToolName>,

    // observability
    /// Per-stage event log, in execution order.
    pub events: Vec<StageEvent>,
}

impl PipelineState {
    /// Start a fresh pipeline state for one request.
    pub fn new(
        query: String,
        session_id: SessionId,
        structured_context: HashMap<String, serde_json::Value>,
        source_language: String,
    ) -> Self {
        Self {
            query,
            session_id,
            structured_context,
            source_language,
            selected_tool: None,
            routing_reason: String::new(),
            route_confidence: 0.0,
            routing_attempts: 0,
            quality_attempts: 0,
            tool_error: None,
            quality_score: None,
            quality_needs_redo: false,
            validation_notes: Vec::new(),
            needs_follow_up: false,
            follow_up_tool: None,
            events: Vec::new(),
        }
    }

    /// Record that `stage` ran, for the observability log.
    pub fn record(&mut self, stage: Stage, detail: impl Into<String>) {
        self.events.push(StageEvent {
            stage,
            detail: detail.into(),
        });
    }
}

/// One entry in the pipeline's observability log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Which stage produced this entry.
    pub stage: Stage,
    /// A short human-readable detail string.
    pub detail: String,
}

/// Declared shape of a registered tool (spec §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name, used as the Route target identifier.
    pub name: ToolName,
    /// Human-readable description shown to the router model.
    pub description: String,
    /// Whether this tool's output passes through the Quality Gate.
    pub opts_into_quality_gate: bool,
    /// Tool to invoke automatically on success, if any.
    pub follow_up: Option<ToolName>,
}

/// One retrieval unit: a single textbook page (spec §3, §4.7).
/// Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    /// Monotonic document id, used as the tie-break key in search.
    pub id: u64,
    /// The page's text content.
    pub content: String,
    /// Fixed-dimension embedding vector.
    pub embedding: Vec<f32>,
    /// Pipe-delimited `class|subject|book|language|page` provenance string.
    pub source: String,
}

/// The five positional fields of a [`CorpusDocument::source`] string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// Class/grade label.
    pub class: String,
    /// Subject label.
    pub subject: String,
    /// Book title.
    pub book: String,
    /// Language of the book.
    pub language: String,
    /// Page number, as text.
    pub page: String,
}

impl CorpusDocument {
    /// Parse `source` into its five positional fields. Strict: anything
    /// other than exactly five pipe-delimited fields is rejected.
    pub fn parsed_source(&self) -> Option<ParsedSource> {
        let parts: Vec<&str> = self.source.split('|').collect();
        if parts.len() != 5 {
            return None;
        }
        Some(ParsedSource {
            class: parts[0].to_string(),
            subject: parts[1].to_string(),
            book: parts[2].to_string(),
            language: parts[3].to_string(),
            page: parts[4].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utterance(text: &str) -> Utterance {
        Utterance {
            text: text.to_string(),
            session_id: None,
            structured_context: HashMap::new(),
            capture_time: Utc::now(),
        }
    }

    #[test]
    fn utterance_rejects_empty_text() {
        assert!(utterance("").validate().is_err());
    }

    #[test]
    fn utterance_accepts_exactly_1000_chars() {
        let u = utterance(&"a".repeat(1000));
        assert!(u.validate().is_ok());
    }

    #[test]
    fn utterance_rejects_1001_chars() {
        let u = utterance(&"a".repeat(1001));
        assert!(u.validate().is_err());
    }

    #[test]
    fn message_is_summary_checks_role_and_sentinel() {
        let base = Message {
            session_id: SessionId::new("s1"),
            monotonic_sequence: 1,
            role: Role::System,
            content: format!("{SUMMARY_SENTINEL} earlier turns discussed fractions"),
            capture_time: Utc::now(),
            metadata: serde_json::Value::Null,
        };
        assert!(base.is_summary());

        let mut not_summary = base.clone();
        not_summary.content = "plain system note".into();
        assert!(!not_summary.is_summary());

        let mut wrong_role = base;
        wrong_role.role = Role::Assistant;
        assert!(!wrong_role.is_summary());
    }

    #[test]
    fn corpus_document_parses_strict_five_field_source() {
        let doc = CorpusDocument {
            id: 1,
            content: "...".into(),
            embedding: vec![0.1, 0.2],
            source: "Class_8|Science|NCERT Science|en|42".into(),
        };
        let parsed = doc.parsed_source().unwrap();
        assert_eq!(parsed.class, "Class_8");
        assert_eq!(parsed.page, "42");
    }

    #[test]
    fn corpus_document_rejects_malformed_source() {
        let doc = CorpusDocument {
            id: 1,
            content: "...".into(),
            embedding: vec![],
            source: "Class_8|Science|NCERT".into(),
        };
        assert!(doc.parsed_source().is_none());
    }

    #[test]
    fn pipeline_state_records_events_in_order() {
        let mut state = PipelineState::new(
            "activity for addition".into(),
            SessionId::new("s1"),
            HashMap::new(),
            "en".into(),
        );
        state.record(Stage::LoadContext, "hydrated 0 messages");
        state.record(Stage::Route, "selected activity_generator");
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.events[0].stage, Stage::LoadContext);
        assert_eq!(state.events[1].stage, Stage::Route);
    }
}
