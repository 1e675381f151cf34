//! Teaching-feedback tool, grounded in
//! `Server/teaching_feedback/analyzer.py`: a structured scorecard for a
//! recorded teaching session, scored on concept coverage, clarity,
//! engagement, and rural-classroom appropriateness.

use crate::common::context_blob;
use async_trait::async_trait;
use paathshala_provider::{CompletionRequest, GenerativeProvider};
use paathshala_tool::{
    ClarityAnalysis, ConceptCoverage, EngagementAnalysis, FeedbackOutput, RuralContextAnalysis,
    ToolDyn, ToolError, ToolInput, ToolOutput,
};
use paathshala_types::{ToolDescriptor, ToolName};
use std::sync::Arc;

const SYSTEM_PROMPT: &str = r#"You are an experienced educational coach specializing in rural Indian \
schools. Analyze a teaching session transcript and give constructive, actionable feedback on concept \
coverage, clarity, student engagement, and rural-classroom appropriateness. Be constructive and \
encouraging, cite specifics from the transcript, keep suggestions realistic for a rural classroom, and \
focus on 3-5 key points rather than an exhaustive list.

Reply with JSON only, no prose, in this exact shape:
{"overall_score": 0.7, \
"concept_coverage": {"concepts_covered": ["..."], "concepts_missed": ["..."], "depth_score": 0.7}, \
"clarity": {"clarity_score": 0.7, "strengths": ["..."], "confusing_parts": ["..."], "language_level": "appropriate"}, \
"engagement": {"engagement_score": 0.7, "techniques_used": ["..."], "missed_opportunities": ["..."]}, \
"rural_context": {"rural_appropriateness": 0.7, "resource_requirements": "basic", "local_context_used": false, "suggestions_for_rural": ["..."]}, \
"key_strengths": ["..."], "improvement_areas": ["..."], \
"actionable_tips": ["..."], "misconceptions_addressed": ["..."], "misconceptions_missed": ["..."]}

Omit "topic" and "grade_level" from your reply; they are filled in separately.
"#;

/// Analyzes a teaching-session transcript and produces a scorecard.
pub struct FeedbackTool {
    provider: Arc<dyn GenerativeProvider>,
    descriptor: ToolDescriptor,
}

impl FeedbackTool {
    /// Construct the tool with its descriptor pre-filled.
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            descriptor: ToolDescriptor {
                name: ToolName::new("teaching_feedback"),
                description: "Analyzes a teaching session transcript and produces a scored feedback report"
                    .into(),
                opts_into_quality_gate: true,
                follow_up: None,
            },
        }
    }
}

#[async_trait]
impl ToolDyn for FeedbackTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let (topic, grade_level) = topic_and_grade(&input);
        let user = format!(
            "Topic: {topic}\nGrade Level: {grade_level}\nContext: {}\n\nTranscript:\n{}",
            context_blob(&input.structured_context),
            input.query,
        );
        let request = CompletionRequest::single_turn(SYSTEM_PROMPT, user);
        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        match paathshala_json::extract::<FeedbackOutput>(&response.text) {
            Ok(mut feedback) => {
                feedback.topic = topic;
                feedback.grade_level = grade_level;
                Ok(ToolOutput::Feedback(feedback))
            }
            Err(e) => {
                tracing::warn!(error = %e, "feedback model reply unparseable, using fallback");
                Ok(ToolOutput::Feedback(fallback_feedback(topic, grade_level)))
            }
        }
    }
}

fn topic_and_grade(input: &ToolInput) -> (String, String) {
    let topic = input
        .structured_context
        .get("topic")
        .and_then(|v| v.as_str())
        .unwrap_or("unspecified topic")
        .to_string();
    let grade_level = input
        .structured_context
        .get("grade_level")
        .and_then(|v| v.as_str())
        .unwrap_or("unspecified grade")
        .to_string();
    (topic, grade_level)
}

/// Mirrors `TeachingFeedbackAnalyzer._generate_fallback_feedback`: a
/// minimal but complete scorecard when the model's reply can't be
/// parsed, rather than failing the request outright.
fn fallback_feedback(topic: String, grade_level: String) -> FeedbackOutput {
    FeedbackOutput {
        topic,
        grade_level,
        overall_score: 0.7,
        concept_coverage: ConceptCoverage {
            concepts_covered: vec!["Unable to analyze — please try again".into()],
            concepts_missed: vec![],
            depth_score: 0.7,
        },
        clarity: ClarityAnalysis {
            clarity_score: 0.7,
            strengths: vec!["Session recorded successfully".into()],
            confusing_parts: vec![],
            language_level: "appropriate".into(),
        },
        engagement: EngagementAnalysis {
            engagement_score: 0.7,
            techniques_used: vec![],
            missed_opportunities: vec![],
        },
        rural_context: RuralContextAnalysis {
            rural_appropriateness: 0.7,
            resource_requirements: "unknown".into(),
            local_context_used: false,
            suggestions_for_rural: vec![],
        },
        key_strengths: vec!["Your dedication to teaching".into()],
        improvement_areas: vec!["Try recording again for detailed feedback".into()],
        actionable_tips: vec![
            "Ensure clear audio quality".into(),
            "Speak clearly during teaching".into(),
        ],
        misconceptions_addressed: vec![],
        misconceptions_missed: vec![],
    }
}
