#![deny(missing_docs)]
//! Tool contract and registry (spec §4.5): an object-safe `ToolDyn`
//! trait plus a `ToolRegistry` that looks tools up by name, with the
//! closed [`ToolOutput`] sum type standing in for a runtime-checked
//! `serde_json::Value` payload.

mod output;

pub use output::{
    ActivityOutput, ClarityAnalysis, ConceptCoverage, EngagementAnalysis, FeedbackOutput,
    MotivationOutput, RuralContextAnalysis, ToolOutput,
};

use async_trait::async_trait;
use paathshala_types::{EngineError, Message, ToolDescriptor, ToolName};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a tool implementation can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller asked for an input shape the tool can't use.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool's own logic failed (model call, internal computation).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Attach the tool's name to produce the engine-wide error type.
    pub fn into_engine_error(self, tool: &ToolName) -> EngineError {
        EngineError::ToolFailed {
            tool: tool.to_string(),
            message: self.to_string(),
        }
    }
}

/// Everything a tool needs to produce a [`ToolOutput`].
#[derive(Debug, Clone)]
pub struct ToolInput {
    /// The (English, post-language-front-end) query text.
    pub query: String,
    /// Structured context passed through from the utterance (grade,
    /// subject, class size, ...).
    pub structured_context: HashMap<String, serde_json::Value>,
    /// Recent conversation history, most recent last.
    pub recent_history: Vec<Message>,
}

/// Object-safe tool interface. Every concrete tool (activity generator,
/// motivation, teaching feedback) implements this.
#[async_trait]
pub trait ToolDyn: Send + Sync {
    /// This tool's static descriptor (name, description, follow-up).
    fn descriptor(&self) -> &ToolDescriptor;

    /// Run the tool.
    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError>;
}

/// Registry of tools available to Route/Execute, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        self.tools
            .insert(tool.descriptor().name.to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &ToolName) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name.as_str())
    }

    /// Iterate over every registered tool's descriptor, for the
    /// router's prompt.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor())
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
