//! Anthropic messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::chat::Message;
use super::{
    GenerateResult, MAX_TOKENS, ProviderAdapter, http_client, raw_body, reported_model,
    resolve_model, send_json, trim_base_url,
};
use crate::error::ProviderError;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

const VENDOR: &str = "Anthropic";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Default, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
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
impl ProviderAdapter for AnthropicProvider {
    fn name(&self) -> &'static str {
        VENDOR
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
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model,
                max_tokens: MAX_TOKENS,
                messages: [Message::user(prompt)],
            });

        let response: MessagesResponse = send_json(VENDOR, request, cancel, raw_body).await?;

        // First block of type "text"; tool or thinking blocks are skipped.
        let message = response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        Ok(GenerateResult {
            message,
            model: reported_model(response.model, model),
            truncated: response.stop_reason.as_deref() == Some("max_tokens"),
        })
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
