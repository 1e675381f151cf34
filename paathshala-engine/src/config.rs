//! Runtime configuration (spec §6), read once at startup from the
//! process environment. Grounded in `Server/orchestrator/config.py`'s
//! `Config` class — one flat table of `os.getenv(KEY, default)` reads —
//! adapted to a typed struct parsed with `std::env::var`.

use std::env;
use std::time::Duration;

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The full configuration table (spec §6), loaded once and treated as
/// read-only for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Generative model identifier.
    pub model_name: String,
    /// Cap on generative output tokens.
    pub max_output_tokens: u32,
    /// Generative sampling temperature.
    pub temperature: f64,
    /// Minimum route confidence to accept without retrying.
    pub confidence_min: f64,
    /// Ceiling on the Route retry loop.
    pub max_routing_retries: u32,
    /// Minimum quality-gate score to accept without regenerating.
    pub quality_min: f64,
    /// Ceiling on the Quality-gate retry loop.
    pub max_quality_retries: u32,
    /// Recent messages surfaced to routing.
    pub context_window: usize,
    /// Message count above which the summarizer triggers.
    pub summarize_threshold: usize,
    /// Messages retained verbatim after summarizing.
    pub summarize_keep_recent: usize,
    /// Hot-cache capacity (sessions).
    pub session_cache_max: usize,
    /// Sweep age, in days, for the retention sweep.
    pub retention_days: i64,
    /// Location of the durable store (implementation-specific; unused
    /// by the in-memory store, read here so a durable backend can pick
    /// it up without a config-shape change).
    pub store_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: "gemini-1.5-flash".into(),
            max_output_tokens: 32768,
            temperature: 0.7,
            confidence_min: 0.6,
            max_routing_retries: 2,
            quality_min: 0.7,
            max_quality_retries: 2,
            context_window: 10,
            summarize_threshold: 20,
            summarize_keep_recent: 5,
            session_cache_max: 1000,
            retention_days: 30,
            store_path: "data/checkpoints.db".into(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) via `dotenvy`, then read every key from
    /// the process environment, falling back to spec defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let default = Self::default();
        Self {
            model_name: env_string("MODEL_NAME", &default.model_name),
            max_output_tokens: env_parsed("MAX_OUTPUT_TOKENS", default.max_output_tokens),
            temperature: env_parsed("TEMPERATURE", default.temperature),
            confidence_min: env_parsed("CONFIDENCE_MIN", default.confidence_min),
            max_routing_retries: env_parsed("MAX_ROUTING_RETRIES", default.max_routing_retries),
            quality_min: env_parsed("QUALITY_MIN", default.quality_min),
            max_quality_retries: env_parsed("MAX_QUALITY_RETRIES", default.max_quality_retries),
            context_window: env_parsed("CONTEXT_WINDOW", default.context_window),
            summarize_threshold: env_parsed("SUMMARIZE_THRESHOLD", default.summarize_threshold),
            summarize_keep_recent: env_parsed(
                "SUMMARIZE_KEEP_RECENT",
                default.summarize_keep_recent,
            ),
            session_cache_max: env_parsed("SESSION_CACHE_MAX", default.session_cache_max),
            retention_days: env_parsed("RETENTION_DAYS", default.retention_days),
            store_path: env_string("STORE_PATH", &default.store_path),
        }
    }

    /// Retention cutoff age as a [`Duration`], for the on-demand sweep.
    pub fn retention_age(&self) -> Duration {
        Duration::from_secs(self.retention_days.max(0) as u64 * 24 * 60 * 60)
    }

    /// The summarizer's thresholds, as [`paathshala_memory::SummarizerConfig`].
    pub fn summarizer_config(&self) -> paathshala_memory::SummarizerConfig {
        paathshala_memory::SummarizerConfig {
            threshold: self.summarize_threshold,
            keep_recent: self.summarize_keep_recent,
        }
    }

    /// The quality gate's thresholds, as [`paathshala_quality::QualityGateConfig`].
    pub fn quality_gate_config(&self) -> paathshala_quality::QualityGateConfig {
        paathshala_quality::QualityGateConfig {
            threshold: self.quality_min,
            max_attempts: self.max_quality_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.max_output_tokens, 32768);
        assert_eq!(config.confidence_min, 0.6);
        assert_eq!(config.max_routing_retries, 2);
        assert_eq!(config.quality_min, 0.7);
        assert_eq!(config.max_quality_retries, 2);
        assert_eq!(config.context_window, 10);
        assert_eq!(config.summarize_threshold, 20);
        assert_eq!(config.summarize_keep_recent, 5);
        assert_eq!(config.session_cache_max, 1000);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn retention_age_converts_days_to_duration() {
        let config = Config {
            retention_days: 1,
            ..Config::default()
        };
        assert_eq!(config.retention_age(), Duration::from_secs(86_400));
    }
}
