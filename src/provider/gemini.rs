//! Google Gemini `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{
    GenerateResult, ProviderAdapter, TEMPERATURE, http_client, reported_model, resolve_model,
    send_json, trim_base_url,
};
use crate::error::ProviderError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini counts thinking tokens against the output cap, so it gets more room.
pub const MAX_OUTPUT_TOKENS: u32 = 4096;

const VENDOR: &str = "Gemini";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// `error.message` from a JSON error body, else the body itself.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body)
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            base_url: trim_base_url(base_url),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    fn name(&self) -> &'static str {
        "Google Gemini"
    }

    async fn generate_message(
        &self,
        prompt: &str,
        model: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<GenerateResult, ProviderError> {
        let model = resolve_model(model, DEFAULT_MODEL);
        let request = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest {
                contents: [Content {
                    parts: [Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: TEMPERATURE,
                    max_output_tokens: MAX_OUTPUT_TOKENS,
                },
            });

        let response: GenerateContentResponse =
            send_json(VENDOR, request, cancel, error_message).await?;

        let candidate = response.candidates.into_iter().next().unwrap_or_default();
        let truncated = candidate
            .finish_reason
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("MAX_TOKENS"));
        let message = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        Ok(GenerateResult {
            message,
            model: reported_model(response.model_version, model),
            truncated,
        })
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_field() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#.to_string();
        assert_eq!(error_message(body), "API key not valid");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("upstream down".into()), "upstream down");
        assert_eq!(error_message(r#"{"error":"x"}"#.into()), r#"{"error":"x"}"#);
    }
}
