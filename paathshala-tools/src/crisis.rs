//! Crisis-handler tool, grounded in
//! `Server/orchestrator/tools/crisis_handler.py`: immediate, no-prop
//! classroom-management interventions for noise, lost focus, disruptive
//! behavior, low energy, or restlessness. Returns the same
//! activity-shaped payload as [`crate::ActivityTool`] (spec §4.5: "an
//! activity-shaped payload describing an immediate intervention").

use crate::common::{call_model_for_json, context_blob};
use async_trait::async_trait;
use paathshala_provider::GenerativeProvider;
use paathshala_tool::{ActivityOutput, ToolDyn, ToolError, ToolInput, ToolOutput};
use paathshala_types::{ToolDescriptor, ToolName};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = r#"You are an expert classroom management advisor for rural Indian \
schools. Give an IMMEDIATE, practical intervention for a classroom crisis (noise, lost focus, \
disruptive behavior, low energy, or restlessness): it must work in under two minutes, need no props \
or electricity, suit 40-60 students, and transition straight back into the lesson. Steps must be \
ultra-specific — exact words, exact actions.

Reply with JSON only, no prose, in this exact shape:
{"name": "...", "description": "...", "materials": ["..."], "steps": ["..."], \
"duration_minutes": 2, "learning_outcome": "...", "tips": ["..."]}
"#;

/// Fixed safe fallback when the model's reply can't be parsed — a
/// teacher facing a live classroom crisis needs *something* immediately
/// usable rather than a failure, matching the Python prototype's
/// always-return-an-ActivityOutput contract.
fn fallback_intervention() -> ActivityOutput {
    ActivityOutput {
        name: "Silent Signal Game".into(),
        description: "Teacher raises a hand in silence; students copy until the room is quiet".into(),
        materials: vec![],
        steps: vec![
            "Raise one hand high and stay completely silent".into(),
            "Students who notice must stop talking and raise their hand too".into(),
            "Within 15 seconds the room should be silent with every hand up".into(),
            "Give a thumbs up and quietly say \"Thank you, let's continue\"".into(),
            "Resume the lesson immediately while students are focused".into(),
        ],
        duration_minutes: 1,
        learning_outcome: "Restores order and attention without shouting".into(),
        tips: Some(vec!["Never speak while your hand is raised — silence is the signal".into()]),
    }
}

/// Handles in-the-moment classroom management crises.
pub struct CrisisTool {
    provider: Arc<dyn GenerativeProvider>,
    descriptor: ToolDescriptor,
}

impl CrisisTool {
    /// Construct the tool. Its descriptor carries the follow-up to the
    /// activity generator that spec §4.5 calls for on success.
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            descriptor: ToolDescriptor {
                name: ToolName::new("crisis_handler"),
                description:
                    "Provides an immediate solution for classroom management issues like noise, chaos, or lost focus"
                        .into(),
                opts_into_quality_gate: false,
                follow_up: Some(ToolName::new("activity_generator")),
            },
        }
    }
}

#[async_trait]
impl ToolDyn for CrisisTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let user = format!(
            "Classroom crisis: {}\nContext: {}\n\nProvide an immediate intervention that works in under two minutes. The teacher needs help right now.",
            input.query,
            context_blob(&input.structured_context)
        );
        match call_model_for_json::<ActivityOutput>(self.provider.as_ref(), SYSTEM_PROMPT, user).await {
            Ok(output) => Ok(ToolOutput::Activity(output)),
            Err(e) => {
                tracing::warn!(error = %e, "crisis handler model reply unparseable, using fallback");
                Ok(ToolOutput::Activity(fallback_intervention()))
            }
        }
    }
}
