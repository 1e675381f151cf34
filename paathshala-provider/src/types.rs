//! Request/response shapes shared by every `GenerativeProvider`
//! implementation. Deliberately narrow — no tool-use content parts —
//! since routing, the quality gate, and the tools in this system each
//! make a single prompt-in/text-out call rather than running a ReAct
//! loop.

use serde::{Deserialize, Serialize};

/// Role of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// A user turn.
    User,
    /// A model turn.
    Assistant,
}

/// One message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Construct a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A request for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model to use; `None` defers to the provider's default.
    pub model: Option<String>,
    /// Conversation turns, in order.
    pub messages: Vec<ChatMessage>,
    /// System prompt, sent out-of-band from `messages` where the
    /// backend supports it.
    pub system: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Build a request with just a system prompt and a single user turn
    /// — the shape every stage in this engine actually needs.
    pub fn single_turn(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: None,
            messages: vec![ChatMessage::user(user)],
            system: Some(system.into()),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Why the provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model produced a complete response.
    EndTurn,
    /// The model hit `max_tokens`.
    MaxTokens,
    /// The response was filtered by the provider's safety layer.
    ContentFilter,
}

/// Token accounting for one completion call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the request.
    pub input_tokens: u64,
    /// Tokens in the response.
    pub output_tokens: u64,
}

/// Result of a single completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token accounting.
    pub usage: TokenUsage,
    /// The model that actually served the request.
    pub model: String,
}
