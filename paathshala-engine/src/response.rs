//! The engine's two output shapes: the unary [`Response`] and the
//! streaming [`EngineEvent`] sequence (spec §4.1 "Streaming contract",
//! §6 "Response record").

use paathshala_tool::ToolOutput;
use paathshala_types::{PipelineState, Stage};
use serde::{Deserialize, Serialize};

/// What `process` returns, and what a `final` streaming event carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Name of the tool that was invoked, or `"none"` if routing never
    /// settled on one.
    pub tool_used: String,
    /// Why that tool was chosen (the router's stated reason, or a
    /// terminal-failure explanation).
    pub reasoning: String,
    /// The tool's output, absent when the request terminated without
    /// a usable result.
    pub result: Option<ToolOutput>,
    /// Final route confidence.
    pub confidence: f64,
    /// Wall-clock time spent in the pipeline, in milliseconds.
    pub processing_ms: u64,
    /// A redacted failure message, present only when the request did
    /// not produce a usable result.
    pub error: Option<String>,
    /// A chained tool's output, when the primary tool's descriptor
    /// called for a follow-up (spec §4.5).
    pub follow_up: Option<Box<ToolOutput>>,
}

impl Response {
    /// Build the structured "cannot produce a result" response shape
    /// every failure path converges on (spec §7: `tool_used`,
    /// `reasoning`, `result`, `confidence`, `processing_ms` are always
    /// present; only `result` and `error` vary).
    pub fn failure(
        tool_used: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: f64,
        processing_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tool_used: tool_used.into(),
            reasoning: reasoning.into(),
            result: None,
            confidence,
            processing_ms,
            error: Some(error.into()),
            follow_up: None,
        }
    }
}

/// One event in a `process_streaming` sequence. The sequence is finite
/// and always ends with exactly one [`EngineEvent::Final`] or one
/// [`EngineEvent::Error`].
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A stage is about to run. Carries a snapshot of the pipeline
    /// state as it stood immediately before the stage executed.
    StageStarted {
        /// Which stage is starting.
        name: Stage,
        /// State immediately before this stage ran.
        snapshot: Box<PipelineState>,
    },
    /// A stage finished. `delta` is a short human-readable description
    /// of what changed (not a full snapshot — streaming consumers diff
    /// against the last `StageStarted` if they need the full state).
    StageCompleted {
        /// Which stage completed.
        name: Stage,
        /// What changed.
        delta: String,
    },
    /// The terminal success event.
    Final {
        /// The finished response.
        response: Box<Response>,
    },
    /// The terminal failure event. Distinct from `Final` carrying an
    /// `error` field: this variant is for failures the engine can't
    /// even shape into a `Response` (e.g. cancellation).
    Error {
        /// What went wrong.
        message: String,
    },
}
