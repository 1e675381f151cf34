//! Teacher-motivation tool, grounded in
//! `Server/orchestrator/tools/teacher_motivation.py`: empathetic,
//! practical burnout support for rural Indian teachers.

use crate::common::{call_model_for_json, context_blob};
use async_trait::async_trait;
use paathshala_provider::GenerativeProvider;
use paathshala_tool::{MotivationOutput, ToolDyn, ToolError, ToolInput, ToolOutput};
use paathshala_types::{ToolDescriptor, ToolName};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = r#"You are an empathetic mentor and coach for teachers, especially those \
in rural Indian schools. Provide practical, compassionate support for teachers experiencing burnout, \
stress, or lack of motivation: no expensive solutions, culturally appropriate, quick wins they can try \
today plus sustainable long-term practices. Always start with validation and empathy, and normalize \
their struggle — they are not alone or failing.

Reply with JSON only, no prose, in this exact shape:
{"title": "...", "acknowledgment": "...", "immediate_tips": ["..."], "long_term_strategies": ["..."], \
"inspiration": "...", "self_care_practices": ["..."], "perspective_shifts": ["..."]}
"#;

/// Mirrors the Python prototype's `except json.JSONDecodeError` branch:
/// a fixed, always-available supportive reply rather than failing the
/// request when the model's output can't be parsed.
fn fallback_motivation() -> MotivationOutput {
    MotivationOutput {
        title: "Support Available for You".into(),
        acknowledgment: "Teaching is challenging, and your feelings are valid.".into(),
        immediate_tips: vec![
            "Take a few deep breaths right now".into(),
            "Write down one positive moment from today".into(),
            "Reach out to a colleague or friend for support".into(),
        ],
        long_term_strategies: vec![
            "Set small boundaries to protect your time".into(),
            "Connect with other teachers for mutual support".into(),
            "Remember your 'why' — the reason you started teaching".into(),
        ],
        inspiration: "You are making a difference, even when it's hard to see. Your dedication matters.".into(),
        self_care_practices: vec![
            "Take short breaks during the day".into(),
            "Get enough sleep".into(),
            "Do something you enjoy outside of teaching".into(),
        ],
        perspective_shifts: vec![
            "Progress over perfection".into(),
            "Your worth isn't measured by student behavior".into(),
            "It's okay to not be okay sometimes".into(),
        ],
    }
}

/// Generates burnout/motivation support for a teacher.
pub struct MotivationTool {
    provider: Arc<dyn GenerativeProvider>,
    descriptor: ToolDescriptor,
}

impl MotivationTool {
    /// Construct the tool with its descriptor pre-filled.
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            descriptor: ToolDescriptor {
                name: ToolName::new("teacher_motivation"),
                description:
                    "Provides motivation, tips, and recovery strategies for teachers experiencing burnout"
                        .into(),
                opts_into_quality_gate: true,
                follow_up: None,
            },
        }
    }
}

#[async_trait]
impl ToolDyn for MotivationTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let user = format!(
            "Teacher's query: {}\nAdditional context: {}",
            input.query,
            context_blob(&input.structured_context)
        );
        match call_model_for_json::<MotivationOutput>(self.provider.as_ref(), SYSTEM_PROMPT, user).await {
            Ok(output) => Ok(ToolOutput::Motivation(output)),
            Err(e) => {
                tracing::warn!(error = %e, "motivation model reply unparseable, using fallback");
                Ok(ToolOutput::Motivation(fallback_motivation()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paathshala_provider::{CompletionRequest, CompletionResponse, ProviderError, StopReason, TokenUsage};
    use std::collections::HashMap;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl GenerativeProvider for StubProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                text: self.reply.clone(),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
                model: "stub".into(),
            })
        }
    }

    fn input(query: &str) -> ToolInput {
        ToolInput {
            query: query.into(),
            structured_context: HashMap::new(),
            recent_history: vec![],
        }
    }

    #[tokio::test]
    async fn produces_motivation_output_from_well_formed_reply() {
        let reply = r#"{
            "title": "You Are Doing Important Work",
            "acknowledgment": "It's okay to feel exhausted.",
            "immediate_tips": ["Breathe", "Drink water"],
            "long_term_strategies": ["Find a mentor"],
            "inspiration": "Your students remember you.",
            "self_care_practices": ["Sleep well"],
            "perspective_shifts": ["Progress over perfection"]
        }"#;
        let tool = MotivationTool::new(Arc::new(StubProvider {
            reply: reply.into(),
        }));
        let out = tool.call(input("I feel so burned out")).await.unwrap();
        match out {
            ToolOutput::Motivation(m) => {
                assert_eq!(m.title, "You Are Doing Important Work");
                assert_eq!(m.immediate_tips.len(), 2);
            }
            _ => panic!("expected Motivation variant"),
        }
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_instead_of_failing() {
        let tool = MotivationTool::new(Arc::new(StubProvider {
            reply: "not json at all".into(),
        }));
        let out = tool.call(input("I feel so burned out")).await.unwrap();
        match out {
            ToolOutput::Motivation(m) => assert_eq!(m.title, "Support Available for You"),
            _ => panic!("expected Motivation variant"),
        }
    }
}
