//! Shared fixtures for the engine's integration tests: a scripted
//! provider that recognizes each stage's system prompt by a stable
//! substring and replies with the right shape, plus a one-line engine
//! builder.

use async_trait::async_trait;
use paathshala_engine::{Config, Engine};
use paathshala_provider::{
    CompletionRequest, CompletionResponse, GenerativeProvider, ProviderError, StopReason, TokenUsage,
};
use paathshala_state::InMemoryConversationStore;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

fn kind_for(system: &str) -> &'static str {
    if system.contains("router for a classroom-assistant") {
        "route"
    } else if system.contains("Translate the user's text into English") {
        "translate_to_en"
    } else if system.contains("Translate the user's text into") {
        "translate_from_en"
    } else if system.contains("hands-on classroom activities") {
        "activity"
    } else if system.contains("classroom management advisor") {
        "crisis"
    } else if system.contains("empathetic mentor and coach") {
        "motivation"
    } else if system.contains("grading a classroom-assistant tool's output") {
        "quality"
    } else if system.contains("educational coach specializing in rural Indian") {
        "feedback"
    } else if system.contains("Summarize this classroom conversation") {
        "summarize"
    } else {
        "unknown"
    }
}

fn default_reply(kind: &str) -> String {
    match kind {
        "route" => r#"{"selected_tool": "activity_generator", "reason": "teacher wants an activity", "extracted_topic": "fractions", "confidence": 0.9}"#.into(),
        "activity" | "crisis" => r#"{"name": "Stick Fractions", "description": "Break sticks into equal parts", "materials": ["sticks"], "steps": ["Break a stick in half"], "duration_minutes": 10, "learning_outcome": "Understand halves", "tips": ["Use dry sticks"]}"#.into(),
        "motivation" => r#"{"title": "Keep Going", "acknowledgment": "Teaching is hard some days.", "immediate_tips": ["Take a breath"], "long_term_strategies": ["Find a mentor"], "inspiration": "You matter to your students.", "self_care_practices": ["Sleep well"], "perspective_shifts": ["Small wins count"]}"#.into(),
        "quality" => r#"{"overall_score": 0.9, "axis_scores": {"accuracy": 0.9, "clarity": 0.9, "age_appropriateness": 0.9, "actionability": 0.9}, "issues": [], "verdict": "pass"}"#.into(),
        "feedback" => r#"{"overall_score": 0.85, "concept_coverage": {"concepts_covered": ["fractions"], "concepts_missed": [], "depth_score": 0.8}, "clarity": {"clarity_score": 0.8, "strengths": ["clear examples"], "confusing_parts": [], "language_level": "appropriate"}, "engagement": {"engagement_score": 0.8, "techniques_used": ["questions"], "missed_opportunities": []}, "rural_context": {"rural_appropriateness": 0.9, "resource_requirements": "none", "local_context_used": true, "suggestions_for_rural": []}, "key_strengths": ["patience"], "improvement_areas": [], "actionable_tips": ["ask more questions"], "misconceptions_addressed": [], "misconceptions_missed": []}"#.into(),
        "summarize" => "The teacher and assistant discussed classroom activities.".into(),
        "translate_to_en" => "I need an activity about fractions".into(),
        "translate_from_en" => "भिन्न के बारे में एक गतिविधि".into(),
        _ => "{}".into(),
    }
}

/// A `GenerativeProvider` driven entirely by canned scripts keyed by
/// which stage's system prompt is asking. Each `script` call installs a
/// queue of replies for one kind; once the queue drains, the last entry
/// repeats (so a three-call loop only needs its two interesting replies
/// scripted).
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<&'static str, VecDeque<String>>>,
    calls: Mutex<HashMap<&'static str, u32>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(self, kind: &'static str, replies: Vec<&str>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(kind, replies.into_iter().map(String::from).collect());
        self
    }

    pub fn call_count(&self, kind: &str) -> u32 {
        *self.calls.lock().unwrap().get(kind).unwrap_or(&0)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let system = request.system.clone().unwrap_or_default();
        let kind = kind_for(&system);

        {
            let mut calls = self.calls.lock().unwrap();
            *calls.entry(kind).or_insert(0) += 1;
        }

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(kind) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) => queue.front().cloned().unwrap_or_else(|| default_reply(kind)),
                None => default_reply(kind),
            }
        };

        Ok(CompletionResponse {
            text: reply,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
            model: "scripted".into(),
        })
    }
}

/// Build an engine over a fresh in-memory store and the routable tool
/// registry, driven by `provider`.
pub fn build_engine(provider: Arc<ScriptedProvider>) -> Engine {
    let store = Arc::new(InMemoryConversationStore::new());
    let registry = paathshala_tools::build_registry(provider.clone());
    Engine::new(Config::default(), store, provider, registry)
}
