#![deny(missing_docs)]
//! The Quality Gate stage (spec §4.3): a second model pass that scores
//! a tool's output and decides whether to regenerate it.
//!
//! Named after the Python prototype's `HALLUCINATION_THRESHOLD` /
//! `MAX_HALLUCINATION_CHECKS` config pair (`Server/orchestrator/config.py`)
//! — this gate is that check, generalized from "is this a hallucination"
//! to "does this output clear the bar" across every tool, using the
//! same robust-JSON-extraction bracket as routing (`paathshala-json`).

use paathshala_json::extract;
use paathshala_provider::{CompletionRequest, GenerativeProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Compaction and retry knobs for the gate (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct QualityGateConfig {
    /// Minimum `overall_score` to pass without regenerating.
    pub threshold: f64,
    /// How many regeneration attempts the engine allows before giving
    /// up and returning the best attempt so far.
    pub max_attempts: u32,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            max_attempts: 2,
        }
    }
}

/// Whether the output should be accepted or regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The output clears the bar as-is.
    Pass,
    /// The tool should be re-run and the result re-checked.
    Regenerate,
}

/// The validator model's raw judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// Overall score in `[0, 1]`.
    pub overall_score: f64,
    /// Per-axis scores (e.g. `"accuracy"`, `"clarity"`,
    /// `"age_appropriateness"`, `"actionability"`), each in `[0, 1]`.
    pub axis_scores: HashMap<String, f64>,
    /// Free-text issues the validator flagged.
    pub issues: Vec<String>,
    /// The validator's own pass/regenerate call.
    pub verdict: Verdict,
}

/// The score used when the validator itself can't be reached — fails
/// open rather than blocking every request on the gate's own
/// availability (spec §4.3, §7).
pub const FALLBACK_SCORE: f64 = 0.75;

fn fallback_score() -> QualityScore {
    QualityScore {
        overall_score: FALLBACK_SCORE,
        axis_scores: HashMap::new(),
        issues: vec!["quality validator unavailable; scored by fallback".into()],
        verdict: Verdict::Pass,
    }
}

const VALIDATOR_SYSTEM_PROMPT: &str = r#"You are grading a classroom-assistant tool's output for a \
teacher. Score it on accuracy, clarity, age appropriateness, and actionability, each from 0 to 1. \
Reply with JSON only, no prose, in this exact shape:
{"overall_score": 0.0, "axis_scores": {"accuracy": 0.0, "clarity": 0.0, "age_appropriateness": 0.0, "actionability": 0.0}, "issues": ["..."], "verdict": "pass"}
"#;

/// Run the quality gate over `tool_output_json`. On a model or parse
/// failure, returns the fail-open [`FALLBACK_SCORE`] rather than an
/// error — a stage further down the pipeline should never block on
/// this gate's own availability.
pub async fn evaluate(
    provider: &dyn GenerativeProvider,
    query: &str,
    tool_output_json: &str,
) -> QualityScore {
    let user_prompt = format!("Teacher's request:\n{query}\n\nTool output:\n{tool_output_json}");
    let request = CompletionRequest::single_turn(VALIDATOR_SYSTEM_PROMPT, user_prompt);

    let response = match provider.complete(request).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "quality gate model call failed");
            return fallback_score();
        }
    };

    match extract::<QualityScore>(&response.text) {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!(error = %e, "quality gate response did not parse");
            fallback_score()
        }
    }
}

/// Decide whether `score` warrants regeneration, honoring the attempt
/// ceiling (spec §4.1: `quality_attempts` is bounded).
pub fn needs_redo(score: &QualityScore, config: &QualityGateConfig, attempts_so_far: u32) -> bool {
    if attempts_so_far >= config.max_attempts {
        return false;
    }
    score.verdict == Verdict::Regenerate || score.overall_score < config.threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paathshala_provider::{CompletionResponse, ProviderError, StopReason, TokenUsage};

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

    struct FailingProvider;

    #[async_trait]
    impl GenerativeProvider for FailingProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::RequestFailed("down".into()))
        }
    }

    #[tokio::test]
    async fn evaluate_parses_well_formed_score() {
        let provider = StubProvider {
            reply: r#"{"overall_score": 0.9, "axis_scores": {"accuracy": 0.9}, "issues": [], "verdict": "pass"}"#.into(),
        };
        let score = evaluate(&provider, "activity for fractions", "{...}").await;
        assert_eq!(score.overall_score, 0.9);
        assert_eq!(score.verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn evaluate_falls_back_on_provider_error() {
        let score = evaluate(&FailingProvider, "q", "{}").await;
        assert_eq!(score.overall_score, FALLBACK_SCORE);
        assert_eq!(score.verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn evaluate_falls_back_on_unparseable_response() {
        let provider = StubProvider {
            reply: "I cannot score this.".into(),
        };
        let score = evaluate(&provider, "q", "{}").await;
        assert_eq!(score.overall_score, FALLBACK_SCORE);
    }

    #[test]
    fn needs_redo_respects_attempt_ceiling() {
        let config = QualityGateConfig {
            threshold: 0.7,
            max_attempts: 2,
        };
        let low_score = QualityScore {
            overall_score: 0.3,
            axis_scores: HashMap::new(),
            issues: vec![],
            verdict: Verdict::Regenerate,
        };
        assert!(needs_redo(&low_score, &config, 0));
        assert!(needs_redo(&low_score, &config, 1));
        assert!(!needs_redo(&low_score, &config, 2));
    }

    #[test]
    fn needs_redo_false_when_above_threshold_and_verdict_pass() {
        let config = QualityGateConfig::default();
        let good_score = QualityScore {
            overall_score: 0.95,
            axis_scores: HashMap::new(),
            issues: vec![],
            verdict: Verdict::Pass,
        };
        assert!(!needs_redo(&good_score, &config, 0));
    }
}
