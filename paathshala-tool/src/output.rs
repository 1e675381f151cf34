//! The tool contract as a closed sum type (spec REDESIGN FLAGS): each
//! tool's result is a distinct variant chosen by the tool's identity,
//! not a `serde_json::Value` checked against a shape at runtime.
//! Grounded in the Python prototype's per-tool Pydantic output models
//! (`Server/orchestrator/schemas.py::ActivityOutput`,
//! `Server/teaching_feedback/schemas.py::TeachingFeedback`).

use serde::{Deserialize, Serialize};

/// Output of the activity-generator tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutput {
    /// Name of the activity.
    pub name: String,
    /// Brief description of the activity.
    pub description: String,
    /// Simple materials needed, commonly available in classrooms.
    pub materials: Vec<String>,
    /// Step-by-step instructions for the teacher.
    pub steps: Vec<String>,
    /// Estimated duration in minutes.
    pub duration_minutes: u32,
    /// What students will understand after this activity.
    pub learning_outcome: String,
    /// Optional tips for the teacher.
    pub tips: Option<Vec<String>>,
}

/// Output of the teacher-motivation/burnout-support tool. Mirrors
/// `teacher_motivation.py`'s emitted shape in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationOutput {
    /// Uplifting title addressing the teacher's situation.
    pub title: String,
    /// Empathetic statement recognizing their struggle.
    pub acknowledgment: String,
    /// 3-5 quick actions the teacher can take today.
    pub immediate_tips: Vec<String>,
    /// 3-5 sustainable practices for ongoing wellbeing.
    pub long_term_strategies: Vec<String>,
    /// A reminder of why teaching matters.
    pub inspiration: String,
    /// Simple, no-cost self-care activities.
    pub self_care_practices: Vec<String>,
    /// Mental reframes to see the situation differently.
    pub perspective_shifts: Vec<String>,
}

/// How thoroughly a teaching session covered its intended concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptCoverage {
    /// Core concepts that were explained.
    pub concepts_covered: Vec<String>,
    /// Important concepts not covered.
    pub concepts_missed: Vec<String>,
    /// How thoroughly concepts were explained, in `[0, 1]`.
    pub depth_score: f64,
}

/// How clear the session's explanations were.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarityAnalysis {
    /// Overall clarity rating, in `[0, 1]`.
    pub clarity_score: f64,
    /// What was explained clearly.
    pub strengths: Vec<String>,
    /// Parts that may confuse students.
    pub confusing_parts: Vec<String>,
    /// `"too_simple"`, `"appropriate"`, or `"too_complex"`.
    pub language_level: String,
}

/// How engaging the session was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementAnalysis {
    /// How engaging the lesson was, in `[0, 1]`.
    pub engagement_score: f64,
    /// Engagement techniques observed (questions, examples, activities).
    pub techniques_used: Vec<String>,
    /// Where the teacher could have engaged students more.
    pub missed_opportunities: Vec<String>,
}

/// Rural-classroom appropriateness of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuralContextAnalysis {
    /// How well suited the session was for rural schools, in `[0, 1]`.
    pub rural_appropriateness: f64,
    /// `"none"`, `"basic"`, or `"advanced"`.
    pub resource_requirements: String,
    /// Did the teacher use local/familiar examples?
    pub local_context_used: bool,
    /// How to make the session more rural-appropriate.
    pub suggestions_for_rural: Vec<String>,
}

/// Output of the teaching-feedback tool: a full scorecard for one
/// recorded teaching session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackOutput {
    /// Topic that was taught. Filled in by the tool after parsing, not
    /// requested from the model.
    #[serde(default)]
    pub topic: String,
    /// Student grade level. Filled in by the tool after parsing, not
    /// requested from the model.
    #[serde(default)]
    pub grade_level: String,
    /// Overall teaching effectiveness, in `[0, 1]`.
    pub overall_score: f64,
    /// What was covered vs. what was missed.
    pub concept_coverage: ConceptCoverage,
    /// How clear the explanations were.
    pub clarity: ClarityAnalysis,
    /// Student engagement analysis.
    pub engagement: EngagementAnalysis,
    /// Rural classroom appropriateness.
    pub rural_context: RuralContextAnalysis,
    /// Top 3-5 things the teacher did well.
    pub key_strengths: Vec<String>,
    /// Top 3-5 areas for improvement.
    pub improvement_areas: Vec<String>,
    /// Specific actions the teacher can take next time.
    pub actionable_tips: Vec<String>,
    /// Common student misconceptions that were addressed.
    pub misconceptions_addressed: Vec<String>,
    /// Common misconceptions that should have been addressed.
    pub misconceptions_missed: Vec<String>,
}

/// The result of invoking a tool, tagged by which tool produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    /// Result from the activity-generator tool.
    Activity(ActivityOutput),
    /// Result from the motivation tool.
    Motivation(MotivationOutput),
    /// Result from the teaching-feedback tool.
    Feedback(FeedbackOutput),
}

impl ToolOutput {
    /// A short label for logging and for the `tool_used` field of the
    /// final response.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolOutput::Activity(_) => "activity",
            ToolOutput::Motivation(_) => "motivation",
            ToolOutput::Feedback(_) => "feedback",
        }
    }
}
