//! The request graph engine itself (spec §4.1): wires the language
//! front-end, conversation memory, routing, tool execution, the
//! quality gate, and follow-up dispatch into the eight-stage pipeline,
//! exposed as both a unary call and a streamed event sequence.

use crate::config::Config;
use crate::response::{EngineEvent, Response};
use crate::route::{route, DEFAULT_TOOL};
use crate::validate::{apply_translated_fields, summarize_for_message, translatable_fields, validate_non_empty};
use paathshala_lang::{detect_language, translate_fields, translate_to_english, DEFAULT_LANGUAGE};
use paathshala_memory::HotCache;
use paathshala_provider::GenerativeProvider;
use paathshala_quality::{evaluate as evaluate_quality, needs_redo};
use paathshala_state::ConversationStore;
use paathshala_tool::{ToolDyn, ToolInput, ToolOutput, ToolRegistry};
use paathshala_tools::FeedbackTool;
use paathshala_types::{EngineError, Message, PipelineState, Role, SessionId, Stage, ToolName, Utterance};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// A hot-cache read of a session (spec §6: `get_context` is a
/// "hot-cache read"). Absent if the session has never been touched in
/// this process, or was evicted / cleared.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// The session this snapshot belongs to.
    pub session_id: SessionId,
    /// Its cached messages, most recent last.
    pub messages: Vec<Message>,
}

/// The request graph engine. Owns no network connections of its own —
/// everything external (model, embedding, durable store) is injected
/// as a trait object so the engine can be driven entirely by stubs in
/// tests.
pub struct Engine {
    config: Config,
    store: Arc<dyn ConversationStore>,
    hot_cache: HotCache,
    provider: Arc<dyn GenerativeProvider>,
    tools: ToolRegistry,
    feedback_tool: FeedbackTool,
    checkpoints: RwLock<HashMap<SessionId, PipelineState>>,
}

impl Engine {
    /// Construct the engine over an already-wired set of collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn GenerativeProvider>,
        tools: ToolRegistry,
    ) -> Self {
        let hot_cache = HotCache::new(config.session_cache_max);
        let feedback_tool = FeedbackTool::new(provider.clone());
        Self {
            config,
            store,
            hot_cache,
            provider,
            tools,
            feedback_tool,
            checkpoints: RwLock::new(HashMap::new()),
        }
    }

    async fn send_stage_started(
        &self,
        events: &Option<mpsc::Sender<EngineEvent>>,
        stage: Stage,
        state: &PipelineState,
    ) {
        if let Some(tx) = events {
            let _ = tx
                .send(EngineEvent::StageStarted {
                    name: stage,
                    snapshot: Box::new(state.clone()),
                })
                .await;
        }
    }

    async fn send_stage_completed(
        &self,
        events: &Option<mpsc::Sender<EngineEvent>>,
        stage: Stage,
        delta: String,
    ) {
        if let Some(tx) = events {
            let _ = tx.send(EngineEvent::StageCompleted { name: stage, delta }).await;
        }
    }

    /// Run one request to completion, returning the finished response.
    /// The only `Err` this ever returns is [`EngineError::Cancelled`];
    /// every other failure is captured as `Response.error`.
    pub async fn process(&self, utterance: Utterance) -> Result<Response, EngineError> {
        self.process_with_cancellation(utterance, CancellationToken::new()).await
    }

    /// Same as [`Engine::process`], but the caller supplies the
    /// cancellation token so it can cancel the in-flight request from
    /// elsewhere (spec §5: "the engine exposes a cancellation token per
    /// request").
    pub async fn process_with_cancellation(
        &self,
        utterance: Utterance,
        cancel: CancellationToken,
    ) -> Result<Response, EngineError> {
        self.execute_pipeline(utterance, cancel, None).await
    }

    /// Run one request, emitting [`EngineEvent`]s stage-by-stage
    /// (spec §4.1 "Streaming contract"). Returns the cancellation token
    /// for this request alongside the event stream; dropping or
    /// cancelling the token stops the pipeline at its next suspension
    /// point.
    pub fn process_streaming(
        self: &Arc<Self>,
        utterance: Utterance,
    ) -> (CancellationToken, ReceiverStream<EngineEvent>) {
        let engine = Arc::clone(self);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.clone();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let sender = tx.clone();
            let result = engine
                .execute_pipeline(utterance, cancel_child, Some(sender))
                .await;
            let final_event = match result {
                Ok(response) => EngineEvent::Final {
                    response: Box::new(response),
                },
                Err(e) => EngineEvent::Error {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(final_event).await;
        });

        (cancel, ReceiverStream::new(rx))
    }

    /// Hot-cache read of a session's recent messages.
    pub async fn get_context(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        self.hot_cache.get(session_id).await.map(|messages| SessionSnapshot {
            session_id: session_id.clone(),
            messages,
        })
    }

    /// Evict a session from the hot cache. Does not touch the durable
    /// store. Returns whether the session was cached beforehand.
    pub async fn clear_context(&self, session_id: &SessionId) -> bool {
        let existed = self.hot_cache.get(session_id).await.is_some();
        self.hot_cache.invalidate(session_id).await;
        existed
    }

    /// Delete every session whose `updated_at` is older than
    /// `RETENTION_DAYS` (spec §4.2 "Retention sweep"). Idempotent.
    pub async fn sweep_retention(&self) -> Result<u64, EngineError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.config.retention_days.max(0));
        Ok(self.store.delete_sessions_older_than(cutoff).await?)
    }

    /// The teaching-feedback entrypoint (spec §4.5: "reachable through
    /// a separate entrypoint and does not go through Route"). Still
    /// passes through the Quality Gate, since the tool's own descriptor
    /// opts into it.
    pub async fn analyze_feedback(
        &self,
        transcript: String,
        topic: String,
        grade_level: String,
    ) -> Result<paathshala_tool::FeedbackOutput, EngineError> {
        let mut structured_context = HashMap::new();
        structured_context.insert("topic".to_string(), serde_json::json!(topic));
        structured_context.insert("grade_level".to_string(), serde_json::json!(grade_level));
        let input = ToolInput {
            query: transcript,
            structured_context,
            recent_history: Vec::new(),
        };

        let quality_cfg = self.config.quality_gate_config();
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let output = self
                .feedback_tool
                .call(input.clone())
                .await
                .map_err(|e| e.into_engine_error(&ToolName::new("teaching_feedback")))?;
            let ToolOutput::Feedback(feedback) = output else {
                return Err(EngineError::ParseFailed(
                    "teaching feedback tool returned a non-feedback payload".into(),
                ));
            };
            let json_blob = serde_json::to_string(&feedback).unwrap_or_default();
            let score = evaluate_quality(self.provider.as_ref(), &input.query, &json_blob).await;
            if needs_redo(&score, &quality_cfg, attempts - 1) {
                continue;
            }
            return Ok(feedback);
        }
    }

    async fn execute_pipeline(
        &self,
        utterance: Utterance,
        cancel: CancellationToken,
        events: Option<mpsc::Sender<EngineEvent>>,
    ) -> Result<Response, EngineError> {
        let started = Instant::now();

        if let Err(e) = utterance.validate() {
            tracing::info!(error = %e, "rejecting invalid utterance");
            return Ok(Response::failure("none", "invalid input", 0.0, elapsed_ms(started), e.to_string()));
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let source_language = detect_language(&utterance.text).to_string();
        let english_text = translate_to_english(self.provider.as_ref(), &utterance.text, &source_language).await;

        let session_id = utterance
            .session_id
            .clone()
            .unwrap_or_else(|| SessionId::new(uuid::Uuid::new_v4().to_string()));

        let mut state = PipelineState::new(
            english_text.clone(),
            session_id.clone(),
            utterance.structured_context.clone(),
            source_language.clone(),
        );
        self.send_stage_started(&events, Stage::LoadContext, &state).await;

        if let Err(e) = self.store.get_or_create_session(&session_id).await {
            tracing::warn!(session_id = %session_id, error = %e, "could not create/fetch session, proceeding without durable context");
        }
        if let Err(e) = self
            .store
            .append_message(
                &session_id,
                Role::User,
                english_text.clone(),
                serde_json::json!({ "source_language": source_language }),
            )
            .await
        {
            tracing::warn!(session_id = %session_id, error = %e, "failed to persist user message");
        }

        let mut compacted = false;
        if let Ok(count) = self.store.get_message_count(&session_id).await {
            if count as usize > self.config.summarize_threshold {
                match paathshala_memory::maybe_compact(
                    self.store.as_ref(),
                    &self.hot_cache,
                    self.provider.as_ref(),
                    &session_id,
                    &self.config.summarizer_config(),
                )
                .await
                {
                    Ok(true) => compacted = true,
                    Ok(false) => {}
                    Err(e) => tracing::warn!(session_id = %session_id, error = %e, "summarization failed"),
                }
            }
        }

        // When compaction ran, `maybe_compact` already installed the
        // compacted view into the hot cache; the durable store's full
        // history is left untouched (spec §4.2), so it's not re-read here.
        let recent_history = if compacted {
            self.hot_cache.get(&session_id).await.unwrap_or_default()
        } else {
            let history = self
                .store
                .get_messages(&session_id, Some(self.config.context_window))
                .await
                .unwrap_or_default();
            self.hot_cache.put(&session_id, history.clone()).await;
            history
        };

        state.record(Stage::LoadContext, format!("hydrated {} messages", recent_history.len()));
        self.send_stage_completed(
            &events,
            Stage::LoadContext,
            format!("hydrated {} messages", recent_history.len()),
        )
        .await;

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        // ---- Route + Confidence gate ----
        loop {
            state.routing_attempts += 1;
            self.send_stage_started(&events, Stage::Route, &state).await;
            let decision = route(self.provider.as_ref(), &self.tools, &state.query, &recent_history).await;
            state.selected_tool = Some(ToolName::new(decision.selected_tool.clone()));
            state.routing_reason = decision.reason.clone();
            state.route_confidence = decision.confidence;
            state.query = decision.extracted_topic.clone();
            state.record(
                Stage::Route,
                format!("selected {} (confidence {:.2})", decision.selected_tool, decision.confidence),
            );
            self.send_stage_completed(&events, Stage::Route, format!("selected {}", decision.selected_tool)).await;

            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            self.send_stage_started(&events, Stage::ConfidenceGate, &state).await;
            if state.route_confidence < self.config.confidence_min {
                if state.routing_attempts <= self.config.max_routing_retries {
                    state.record(Stage::ConfidenceGate, "confidence below threshold, retrying route");
                    self.send_stage_completed(&events, Stage::ConfidenceGate, "retrying".into()).await;
                    continue;
                }
                state.record(Stage::ConfidenceGate, "confidence below threshold, retries exhausted");
                self.send_stage_completed(&events, Stage::ConfidenceGate, "terminated".into()).await;
                return Ok(Response::failure(
                    state
                        .selected_tool
                        .as_ref()
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "none".into()),
                    "could not route this request with sufficient confidence",
                    state.route_confidence,
                    elapsed_ms(started),
                    "low routing confidence",
                ));
            }
            state.record(Stage::ConfidenceGate, "confidence accepted");
            self.send_stage_completed(&events, Stage::ConfidenceGate, "accepted".into()).await;
            break;
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let tool_name = state.selected_tool.clone().unwrap_or_else(|| ToolName::new(DEFAULT_TOOL));
        let tool = match self.tools.get(&tool_name).cloned() {
            Some(t) => t,
            None => {
                return Ok(Response::failure(
                    tool_name.to_string(),
                    state.routing_reason.clone(),
                    state.route_confidence,
                    elapsed_ms(started),
                    format!("tool '{tool_name}' is not registered"),
                ));
            }
        };
        let descriptor = tool.descriptor().clone();

        // ---- Execute + Quality gate ----
        let quality_cfg = self.config.quality_gate_config();
        let mut accepted_output: Option<ToolOutput> = None;
        loop {
            state.quality_attempts += 1;
            self.send_stage_started(&events, Stage::Execute, &state).await;
            let call_result = tool
                .call(ToolInput {
                    query: state.query.clone(),
                    structured_context: state.structured_context.clone(),
                    recent_history: recent_history.clone(),
                })
                .await;

            let output = match call_result {
                Ok(output) => output,
                Err(e) => {
                    state.tool_error = Some(e.to_string());
                    state.record(Stage::Execute, format!("tool failed: {e}"));
                    self.send_stage_completed(&events, Stage::Execute, "tool failed".into()).await;
                    break;
                }
            };
            state.record(Stage::Execute, "tool produced output");
            self.send_stage_completed(&events, Stage::Execute, "tool produced output".into()).await;

            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            self.send_stage_started(&events, Stage::ValidateStructure, &state).await;
            if let Err(reason) = validate_non_empty(&output) {
                state.tool_error = Some(reason.clone());
                state.record(Stage::ValidateStructure, format!("invalid structure: {reason}"));
                self.send_stage_completed(&events, Stage::ValidateStructure, "invalid structure".into()).await;
                break;
            }
            state.record(Stage::ValidateStructure, "structure valid");
            self.send_stage_completed(&events, Stage::ValidateStructure, "structure valid".into()).await;

            if !descriptor.opts_into_quality_gate {
                accepted_output = Some(output);
                break;
            }

            self.send_stage_started(&events, Stage::QualityGate, &state).await;
            let tool_output_json = serde_json::to_string(&output).unwrap_or_default();
            let score = evaluate_quality(self.provider.as_ref(), &state.query, &tool_output_json).await;
            let redo = needs_redo(&score, &quality_cfg, state.quality_attempts - 1);
            state.quality_score = Some(score.overall_score);
            state.quality_needs_redo = redo;
            state.validation_notes = score.issues.clone();
            state.record(
                Stage::QualityGate,
                format!("score {:.2}, verdict {:?}", score.overall_score, score.verdict),
            );
            self.send_stage_completed(&events, Stage::QualityGate, format!("score {:.2}", score.overall_score)).await;

            if redo {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                continue;
            }
            accepted_output = Some(output);
            break;
        }

        let Some(mut output) = accepted_output else {
            return Ok(Response::failure(
                tool_name.to_string(),
                state.routing_reason.clone(),
                state.route_confidence,
                elapsed_ms(started),
                state.tool_error.clone().unwrap_or_else(|| "tool execution failed".into()),
            ));
        };

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        // ---- Follow-up ----
        self.send_stage_started(&events, Stage::FollowUp, &state).await;
        let mut follow_up_output: Option<ToolOutput> = None;
        if let Some(follow_up_name) = descriptor.follow_up.clone() {
            state.needs_follow_up = true;
            state.follow_up_tool = Some(follow_up_name.clone());
            if let Some(follow_up_tool) = self.tools.get(&follow_up_name).cloned() {
                let follow_up_input = ToolInput {
                    query: state.query.clone(),
                    structured_context: state.structured_context.clone(),
                    recent_history: recent_history.clone(),
                };
                match follow_up_tool.call(follow_up_input).await {
                    Ok(fu_output) if validate_non_empty(&fu_output).is_ok() => {
                        state.record(Stage::FollowUp, format!("invoked {follow_up_name}"));
                        follow_up_output = Some(fu_output);
                    }
                    Ok(_) => {
                        state.record(
                            Stage::FollowUp,
                            format!("{follow_up_name} produced an invalid payload, dropping follow-up"),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, tool = %follow_up_name, "follow-up tool call failed");
                        state.record(Stage::FollowUp, format!("{follow_up_name} failed: {e}"));
                    }
                }
            }
        } else {
            state.record(Stage::FollowUp, "no follow-up declared");
        }
        self.send_stage_completed(&events, Stage::FollowUp, "done".into()).await;

        if source_language != DEFAULT_LANGUAGE {
            let fields = translatable_fields(&output);
            if !fields.is_empty() {
                let translated = translate_fields(self.provider.as_ref(), &fields, &source_language).await;
                apply_translated_fields(&mut output, translated);
            }
            if let Some(fu) = &mut follow_up_output {
                let fu_fields = translatable_fields(fu);
                if !fu_fields.is_empty() {
                    let translated = translate_fields(self.provider.as_ref(), &fu_fields, &source_language).await;
                    apply_translated_fields(fu, translated);
                }
            }
        }

        // ---- Finalize ----
        self.send_stage_started(&events, Stage::Finalize, &state).await;
        let mut summaries = vec![(tool_name.to_string(), summarize_for_message(&output))];
        if let Some(fu) = &follow_up_output {
            summaries.push((
                state.follow_up_tool.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                summarize_for_message(fu),
            ));
        }

        let mut updated_history = recent_history;
        for (tool, summary) in &summaries {
            if let Err(e) = self
                .store
                .append_message(
                    &session_id,
                    Role::Assistant,
                    summary.clone(),
                    serde_json::json!({ "tool": tool }),
                )
                .await
            {
                tracing::warn!(session_id = %session_id, error = %e, "failed to persist assistant message");
            }

            let next_sequence = updated_history.last().map(|m| m.monotonic_sequence + 1).unwrap_or(1);
            updated_history.push(Message {
                session_id: session_id.clone(),
                monotonic_sequence: next_sequence,
                role: Role::Assistant,
                content: summary.clone(),
                capture_time: chrono::Utc::now(),
                metadata: serde_json::json!({ "tool": tool }),
            });
        }
        if updated_history.len() > self.config.context_window {
            let overflow = updated_history.len() - self.config.context_window;
            updated_history.drain(0..overflow);
        }
        self.hot_cache.put(&session_id, updated_history).await;

        let processing_ms = elapsed_ms(started);
        state.record(Stage::Finalize, format!("processing_ms={processing_ms}"));
        self.send_stage_completed(&events, Stage::Finalize, format!("processing_ms={processing_ms}")).await;

        {
            let mut checkpoints = self.checkpoints.write().await;
            checkpoints.insert(session_id.clone(), state.clone());
        }

        Ok(Response {
            tool_used: tool_name.to_string(),
            reasoning: state.routing_reason.clone(),
            result: Some(output),
            confidence: state.route_confidence,
            processing_ms,
            error: None,
            follow_up: follow_up_output.map(Box::new),
        })
    }

    /// The last checkpointed pipeline state for a session, if one ran
    /// to at least `Finalize` since the engine started (spec §4.1
    /// "Checkpointing").
    pub async fn checkpoint(&self, session_id: &SessionId) -> Option<PipelineState> {
        self.checkpoints.read().await.get(session_id).cloned()
    }
}
