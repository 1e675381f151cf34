//! The Validate-structure stage (spec §4.1 node 5) and the small
//! per-shape helpers the Finalize and language-front-end brackets need:
//! a short textual summary for the durable message log, and the
//! translatable-field flatten/restore pair (spec §4.4: "exactly which
//! fields are translatable is declared per tool result shape").

use paathshala_tool::ToolOutput;

/// Check that a tool's output is non-empty and internally consistent
/// enough to return to the caller. Declared per-shape rather than
/// generically, mirroring the Python prototype's per-tool Pydantic
/// validation.
pub fn validate_non_empty(output: &ToolOutput) -> Result<(), String> {
    match output {
        ToolOutput::Activity(a) => {
            if a.name.trim().is_empty() {
                return Err("activity has no name".into());
            }
            if a.steps.is_empty() {
                return Err("activity has no steps".into());
            }
            Ok(())
        }
        ToolOutput::Motivation(m) => {
            if m.title.trim().is_empty() {
                return Err("motivation has no title".into());
            }
            Ok(())
        }
        ToolOutput::Feedback(f) => {
            if f.topic.trim().is_empty() {
                return Err("feedback has no topic".into());
            }
            Ok(())
        }
    }
}

/// A short, human-readable line summarizing a tool's output, appended
/// as the session's `assistant` message (spec §4.1 node 8, Finalize).
pub fn summarize_for_message(output: &ToolOutput) -> String {
    match output {
        ToolOutput::Activity(a) => format!("[activity] {}: {}", a.name, a.description),
        ToolOutput::Motivation(m) => format!("[motivation] {}: {}", m.title, m.acknowledgment),
        ToolOutput::Feedback(f) => format!(
            "[feedback] {} ({}): overall score {:.2}",
            f.topic, f.grade_level, f.overall_score
        ),
    }
}

/// Flatten every translatable field of `output`, in a fixed order that
/// [`apply_translated_fields`] must mirror exactly.
pub fn translatable_fields(output: &ToolOutput) -> Vec<String> {
    match output {
        ToolOutput::Activity(a) => {
            let mut fields = vec![a.name.clone(), a.description.clone(), a.learning_outcome.clone()];
            fields.extend(a.materials.iter().cloned());
            fields.extend(a.steps.iter().cloned());
            if let Some(tips) = &a.tips {
                fields.extend(tips.iter().cloned());
            }
            fields
        }
        ToolOutput::Motivation(m) => {
            let mut fields = vec![m.title.clone(), m.acknowledgment.clone(), m.inspiration.clone()];
            fields.extend(m.immediate_tips.iter().cloned());
            fields.extend(m.long_term_strategies.iter().cloned());
            fields.extend(m.self_care_practices.iter().cloned());
            fields.extend(m.perspective_shifts.iter().cloned());
            fields
        }
        // Teaching feedback isn't reachable through Route and isn't
        // translated (spec §4.5): it's consumed by whatever called the
        // separate entrypoint directly.
        ToolOutput::Feedback(_) => Vec::new(),
    }
}

/// Write `translated` back into `output`'s translatable fields, in the
/// same order [`translatable_fields`] produced them. Panics on a length
/// mismatch — a caller bug, not a runtime condition.
pub fn apply_translated_fields(output: &mut ToolOutput, translated: Vec<String>) {
    let mut it = translated.into_iter();
    match output {
        ToolOutput::Activity(a) => {
            a.name = it.next().expect("name");
            a.description = it.next().expect("description");
            a.learning_outcome = it.next().expect("learning_outcome");
            for m in a.materials.iter_mut() {
                *m = it.next().expect("material");
            }
            for s in a.steps.iter_mut() {
                *s = it.next().expect("step");
            }
            if let Some(tips) = &mut a.tips {
                for t in tips.iter_mut() {
                    *t = it.next().expect("tip");
                }
            }
        }
        ToolOutput::Motivation(m) => {
            m.title = it.next().expect("title");
            m.acknowledgment = it.next().expect("acknowledgment");
            m.inspiration = it.next().expect("inspiration");
            for t in m.immediate_tips.iter_mut() {
                *t = it.next().expect("immediate_tip");
            }
            for s in m.long_term_strategies.iter_mut() {
                *s = it.next().expect("long_term_strategy");
            }
            for s in m.self_care_practices.iter_mut() {
                *s = it.next().expect("self_care_practice");
            }
            for p in m.perspective_shifts.iter_mut() {
                *p = it.next().expect("perspective_shift");
            }
        }
        ToolOutput::Feedback(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paathshala_tool::ActivityOutput;

    fn activity() -> ToolOutput {
        ToolOutput::Activity(ActivityOutput {
            name: "Stick Fractions".into(),
            description: "Break sticks into equal parts".into(),
            materials: vec!["sticks".into()],
            steps: vec!["Break a stick in half".into()],
            duration_minutes: 10,
            learning_outcome: "Understand halves".into(),
            tips: Some(vec!["Use dry sticks".into()]),
        })
    }

    #[test]
    fn rejects_activity_with_no_steps() {
        let mut out = activity();
        if let ToolOutput::Activity(a) = &mut out {
            a.steps.clear();
        }
        assert!(validate_non_empty(&out).is_err());
    }

    #[test]
    fn accepts_well_formed_activity() {
        assert!(validate_non_empty(&activity()).is_ok());
    }

    #[test]
    fn translatable_fields_roundtrip_through_apply() {
        let out = activity();
        let fields = translatable_fields(&out);
        assert_eq!(fields.len(), 6); // name, description, learning_outcome, 1 material, 1 step, 1 tip

        let translated: Vec<String> = fields.iter().map(|f| format!("HI:{f}")).collect();
        let mut translated_out = out.clone();
        apply_translated_fields(&mut translated_out, translated);
        if let ToolOutput::Activity(a) = &translated_out {
            assert_eq!(a.name, "HI:Stick Fractions");
            assert_eq!(a.materials[0], "HI:sticks");
            assert_eq!(a.tips.as_ref().unwrap()[0], "HI:Use dry sticks");
        }
    }

    #[test]
    fn feedback_has_no_translatable_fields() {
        use paathshala_tool::{ClarityAnalysis, ConceptCoverage, EngagementAnalysis, FeedbackOutput, RuralContextAnalysis};
        let out = ToolOutput::Feedback(FeedbackOutput {
            topic: "fractions".into(),
            grade_level: "5".into(),
            overall_score: 0.8,
            concept_coverage: ConceptCoverage {
                concepts_covered: vec![],
                concepts_missed: vec![],
                depth_score: 0.8,
            },
            clarity: ClarityAnalysis {
                clarity_score: 0.8,
                strengths: vec![],
                confusing_parts: vec![],
                language_level: "appropriate".into(),
            },
            engagement: EngagementAnalysis {
                engagement_score: 0.8,
                techniques_used: vec![],
                missed_opportunities: vec![],
            },
            rural_context: RuralContextAnalysis {
                rural_appropriateness: 0.8,
                resource_requirements: "none".into(),
                local_context_used: true,
                suggestions_for_rural: vec![],
            },
            key_strengths: vec![],
            improvement_areas: vec![],
            actionable_tips: vec![],
            misconceptions_addressed: vec![],
            misconceptions_missed: vec![],
        });
        assert!(translatable_fields(&out).is_empty());
    }
}
