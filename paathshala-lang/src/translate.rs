//! Per-field translation, used to bring a non-English utterance into
//! English before routing and to translate tool output fields back to
//! the teacher's language before the response is returned. Falls back
//! to the original text on model failure rather than failing the
//! request outright (spec §4.4, §7).

use paathshala_provider::{CompletionRequest, GenerativeProvider};

/// Translate `text` from `source_language` into English. A no-op
/// returning `text` unchanged when `source_language` is already
/// English.
pub async fn translate_to_english(
    provider: &dyn GenerativeProvider,
    text: &str,
    source_language: &str,
) -> String {
    if source_language == "en" || text.trim().is_empty() {
        return text.to_string();
    }
    translate(provider, text, "English").await.unwrap_or_else(|| text.to_string())
}

/// Translate each of `fields` from English into `target_language`,
/// preserving order. Any field that fails to translate is returned
/// unchanged (English) rather than dropped — the teacher would rather
/// see English than a missing field.
pub async fn translate_fields(
    provider: &dyn GenerativeProvider,
    fields: &[String],
    target_language: &str,
) -> Vec<String> {
    if target_language == "en" {
        return fields.to_vec();
    }

    let mut out = Vec::with_capacity(fields.len());
    for field in fields {
        if field.trim().is_empty() {
            out.push(field.clone());
            continue;
        }
        let translated = translate(provider, field, language_name(target_language))
            .await
            .unwrap_or_else(|| field.clone());
        out.push(translated);
    }
    out
}

async fn translate(provider: &dyn GenerativeProvider, text: &str, target: &str) -> Option<String> {
    let system = format!(
        "Translate the user's text into {target}. Reply with the translation only, no quotes, no preamble."
    );
    let request = CompletionRequest::single_turn(system, text);
    match provider.complete(request).await {
        Ok(response) => {
            let trimmed = response.text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "translation model call failed");
            None
        }
    }
}

fn language_name(code: &str) -> &'static str {
    match code {
        "hi" => "Hindi",
        "ta" => "Tamil",
        "bn" => "Bengali",
        "te" => "Telugu",
        "gu" => "Gujarati",
        "kn" => "Kannada",
        "ml" => "Malayalam",
        "pa" => "Punjabi",
        "or" => "Odia",
        _ => "English",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paathshala_provider::{CompletionResponse, ProviderError, StopReason, TokenUsage};

    struct StubProvider {
        reply: Option<String>,
    }

    #[async_trait]
    impl GenerativeProvider for StubProvider {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                    model: "stub".into(),
                }),
                None => Err(ProviderError::RequestFailed("down".into())),
            }
        }
    }

    #[tokio::test]
    async fn english_source_is_a_no_op() {
        let provider = StubProvider {
            reply: Some("should not be used".into()),
        };
        let out = translate_to_english(&provider, "I need help", "en").await;
        assert_eq!(out, "I need help");
    }

    #[tokio::test]
    async fn non_english_source_is_translated() {
        let provider = StubProvider {
            reply: Some("I need help".into()),
        };
        let out = translate_to_english(&provider, "मुझे मदद चाहिए", "hi").await;
        assert_eq!(out, "I need help");
    }

    #[tokio::test]
    async fn translate_falls_back_to_original_on_failure() {
        let provider = StubProvider { reply: None };
        let out = translate_to_english(&provider, "मुझे मदद चाहिए", "hi").await;
        assert_eq!(out, "मुझे मदद चाहिए");
    }

    #[tokio::test]
    async fn translate_fields_targets_english_is_noop() {
        let provider = StubProvider {
            reply: Some("unused".into()),
        };
        let fields = vec!["Activity".into(), "Description".into()];
        let out = translate_fields(&provider, &fields, "en").await;
        assert_eq!(out, fields);
    }

    #[tokio::test]
    async fn translate_fields_skips_empty_fields() {
        let provider = StubProvider {
            reply: Some("translated".into()),
        };
        let fields = vec!["".into(), "hello".into()];
        let out = translate_fields(&provider, &fields, "hi").await;
        assert_eq!(out[0], "");
        assert_eq!(out[1], "translated");
    }
}
