//! HTTP-backed provider for Google's Gemini API, implementing both
//! [`GenerativeProvider`] and [`EmbeddingProvider`]: a thin client
//! struct, a private wire-format module, and a `build_request` /
//! `parse_response` pair per call.
//!
//! Grounded in the Python prototype, which drove `google.genai` for
//! generation (`Server/orchestrator/orchestrator.py`) — the embedding
//! side there used a local sentence-transformers model rather than an
//! API. This provider calls Gemini's embedding endpoint instead, since
//! this crate treats every model call as an external service boundary;
//! see DESIGN.md for that tradeoff.

use crate::provider::{EmbeddingProvider, GenerativeProvider, ProviderError};
use crate::types::{ChatMessage, CompletionRequest, CompletionResponse, Role, StopReason, TokenUsage};
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const EMBEDDING_DIMENSION: usize = 768;

/// Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    client: reqwest::Client,
    api_base: String,
    model: String,
    embedding_model: String,
    default_temperature: Option<f64>,
    default_max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    /// Create a new provider with the given API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: DEFAULT_MODEL.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            default_temperature: None,
            default_max_output_tokens: None,
        }
    }

    /// Override the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for testing or proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the sampling temperature applied to any call that doesn't
    /// specify its own (spec §6 `TEMPERATURE`).
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Set the output token cap applied to any call that doesn't
    /// specify its own (spec §6 `MAX_OUTPUT_TOKENS`).
    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_output_tokens = Some(max_tokens);
        self
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, model, self.api_key
        )
    }

    fn embed_url(&self) -> String {
        format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.api_base, self.embedding_model, self.api_key
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

fn role_to_gemini(role: Role) -> &'static str {
    match role {
        Role::User | Role::System => "user",
        Role::Assistant => "model",
    }
}

fn finish_reason_to_stop(reason: Option<&str>) -> StopReason {
    match reason {
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some("SAFETY") | Some("RECITATION") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}

impl GeminiProvider {
    fn build_request(&self, request: &CompletionRequest) -> GenerateRequest {
        let contents = request
            .messages
            .iter()
            .map(|m: &ChatMessage| GeminiContent {
                role: Some(role_to_gemini(m.role).to_string()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let system_instruction = request.system.as_ref().map(|s| GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: s.clone() }],
        });

        let temperature = request.temperature.or(self.default_temperature);
        let max_output_tokens = request.max_tokens.or(self.default_max_output_tokens);
        let generation_config = if temperature.is_some() || max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature,
                max_output_tokens,
            })
        } else {
            None
        };

        GenerateRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let body = self.build_request(&request);

        let response = self
            .client
            .post(self.generate_url(&model))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::AuthFailed(response.status().to_string()));
        }
        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no candidates returned".into()))?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = parsed
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            text,
            stop_reason: finish_reason_to_stop(candidate.finish_reason.as_deref()),
            usage,
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model_path = format!("models/{}", self.embedding_model);
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedContentRequest {
                    model: model_path.clone(),
                    content: GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: t.clone() }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.embed_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping_folds_system_into_user() {
        assert_eq!(role_to_gemini(Role::System), "user");
        assert_eq!(role_to_gemini(Role::User), "user");
        assert_eq!(role_to_gemini(Role::Assistant), "model");
    }

    #[test]
    fn finish_reason_maps_known_values() {
        assert_eq!(finish_reason_to_stop(Some("MAX_TOKENS")), StopReason::MaxTokens);
        assert_eq!(
            finish_reason_to_stop(Some("SAFETY")),
            StopReason::ContentFilter
        );
        assert_eq!(finish_reason_to_stop(Some("STOP")), StopReason::EndTurn);
        assert_eq!(finish_reason_to_stop(None), StopReason::EndTurn);
    }

    #[test]
    fn build_request_carries_system_and_generation_config() {
        let provider = GeminiProvider::new("test-key");
        let request = CompletionRequest {
            model: None,
            messages: vec![ChatMessage::user("hello")],
            system: Some("be terse".into()),
            temperature: Some(0.2),
            max_tokens: Some(256),
        };
        let built = provider.build_request(&request);
        assert!(built.system_instruction.is_some());
        assert_eq!(built.contents.len(), 1);
        assert_eq!(built.generation_config.unwrap().max_output_tokens, Some(256));
    }
}
