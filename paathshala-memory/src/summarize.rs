//! Threshold-triggered compaction of a session's message log.
//!
//! Compact once a session exceeds `SUMMARIZATION_THRESHOLD` messages,
//! keeping exactly `SUMMARIZATION_KEEP_RECENT` of the most recent plus
//! one synthesized `[summary]` message standing in for everything
//! older. Falls back to plain truncation (drop the old messages, no
//! summary) if the model call fails — a fail-open posture on provider
//! errors.
//!
//! Compaction never touches the durable store: the full history stays
//! there, and the compacted view is installed directly into the hot
//! cache. Only the in-process view of a session shrinks.

use crate::HotCache;
use paathshala_provider::{CompletionRequest, GenerativeProvider};
use paathshala_state::ConversationStore;
use paathshala_types::{EngineError, Message, Role, SessionId, SUMMARY_SENTINEL};

/// Compaction thresholds (spec §6 configuration table).
#[derive(Debug, Clone, Copy)]
pub struct SummarizerConfig {
    /// Compact once a session has more than this many messages.
    pub threshold: usize,
    /// How many of the most recent messages to keep verbatim.
    pub keep_recent: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            keep_recent: 6,
        }
    }
}

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize this classroom conversation between a teacher \
and an assistant in 2-3 sentences, preserving names, grades, subjects, and any decisions made. \
Write the summary itself with no preamble.";

/// Compact `session_id`'s hot-cache view if its durable log is over
/// threshold. Returns `true` if compaction ran (summarized or
/// truncated), `false` if the session was under threshold and nothing
/// changed. Only installs the compacted view into `hot_cache` — the
/// durable store's history is read, never rewritten (spec §4.2).
pub async fn maybe_compact(
    store: &dyn ConversationStore,
    hot_cache: &HotCache,
    provider: &dyn GenerativeProvider,
    session_id: &SessionId,
    config: &SummarizerConfig,
) -> Result<bool, EngineError> {
    let count = store.get_message_count(session_id).await? as usize;
    if count <= config.threshold {
        return Ok(false);
    }

    let messages = store.get_messages(session_id, None).await?;
    let split = messages.len().saturating_sub(config.keep_recent);
    let (older, recent) = messages.split_at(split);

    let replacement = match synthesize_summary(provider, older).await {
        Ok(summary_text) => {
            let summary = Message {
                session_id: session_id.clone(),
                monotonic_sequence: 0,
                role: Role::System,
                content: format!("{SUMMARY_SENTINEL} {summary_text}"),
                capture_time: chrono::Utc::now(),
                metadata: serde_json::json!({ "summarized_count": older.len() }),
            };
            let mut combined = vec![summary];
            combined.extend_from_slice(recent);
            combined
        }
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "summarization model call failed, falling back to plain truncation");
            recent.to_vec()
        }
    };

    let renumbered = renumber(replacement);
    hot_cache.put(session_id, renumbered).await;
    Ok(true)
}

fn renumber(mut messages: Vec<Message>) -> Vec<Message> {
    for (i, m) in messages.iter_mut().enumerate() {
        m.monotonic_sequence = i as u64 + 1;
    }
    messages
}

async fn synthesize_summary(
    provider: &dyn GenerativeProvider,
    older: &[Message],
) -> Result<String, EngineError> {
    if older.is_empty() {
        return Ok(String::new());
    }
    let transcript = older
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    let request = CompletionRequest::single_turn(SUMMARY_SYSTEM_PROMPT, transcript);
    let response = provider.complete(request).await?;
    Ok(response.text.trim().to_string())
}
