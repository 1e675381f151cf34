//! Activity-generator tool, grounded in
//! `Server/orchestrator/tools/activity_generator.py`: hands-on,
//! low-resource classroom activities built from materials a rural
//! Indian classroom actually has on hand.

use crate::common::{call_model_for_json, context_blob};
use async_trait::async_trait;
use paathshala_provider::GenerativeProvider;
use paathshala_tool::{ActivityOutput, ToolDyn, ToolError, ToolInput, ToolOutput};
use paathshala_types::{ToolDescriptor, ToolName};
use std::sync::Arc;

/// Generic hands-on fallback when the model's reply can't be parsed,
/// mirroring `ActivityGenerator`'s own except-branch in the Python
/// prototype: a teacher asking for an activity needs *something*
/// immediately usable rather than a failure.
fn fallback_activity(topic: &str) -> ActivityOutput {
    ActivityOutput {
        name: "Hands-On Exploration Activity".into(),
        description: format!("Students physically explore {topic} using available materials"),
        materials: vec![
            "Stones or pebbles".into(),
            "Sticks".into(),
            "Chalk".into(),
            "Open ground space".into(),
        ],
        steps: vec![
            "Gather materials: give each student 10 stones and 5 sticks".into(),
            format!("Introduce the topic \"{topic}\" with a simple question"),
            "Students use their materials to represent or demonstrate the concept".into(),
            "Students walk around and observe what others created".into(),
            "Best examples are shared with the class".into(),
            "Clarify the concept using the students' demonstrations".into(),
        ],
        duration_minutes: 15,
        learning_outcome: format!("Students actively explore {topic} through hands-on manipulation"),
        tips: Some(vec!["Adapt based on specific topic requirements".into()]),
    }
}

const SYSTEM_PROMPT: &str = r#"You design hands-on classroom activities for rural Indian schools with \
no electricity, no projector, and no printed worksheets. Activities must be physically interactive \
— students sort, build, measure, role-play, or move — using materials on hand: sticks, stones, \
leaves, mud, rope, chalk, seeds, grains, bottles, thread. Keep instructions simple enough for a \
teacher with basic training and a class with short attention spans.

Reply with JSON only, no prose, in this exact shape:
{"name": "...", "description": "...", "materials": ["..."], "steps": ["..."], \
"duration_minutes": 10, "learning_outcome": "...", "tips": ["..."]}
"#;

/// Generates a hands-on classroom activity for a topic.
pub struct ActivityTool {
    provider: Arc<dyn GenerativeProvider>,
    descriptor: ToolDescriptor,
}

impl ActivityTool {
    /// Construct the tool with its descriptor pre-filled.
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            descriptor: ToolDescriptor {
                name: ToolName::new("activity_generator"),
                description:
                    "Generates a hands-on, low-resource classroom activity for a topic the teacher names"
                        .into(),
                opts_into_quality_gate: true,
                follow_up: None,
            },
        }
    }
}

#[async_trait]
impl ToolDyn for ActivityTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let user = format!(
            "Teacher's request: {}\nClassroom context: {}",
            input.query,
            context_blob(&input.structured_context)
        );
        match call_model_for_json::<ActivityOutput>(self.provider.as_ref(), SYSTEM_PROMPT, user).await {
            Ok(output) => Ok(ToolOutput::Activity(output)),
            Err(e) => {
                tracing::warn!(error = %e, "activity generator model reply unparseable, using fallback");
                Ok(ToolOutput::Activity(fallback_activity(&input.query)))
            }
        }
    }
}
