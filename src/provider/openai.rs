//! OpenAI chat completions.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::chat::{ChatRequest, ChatResponse};
use super::{
    GenerateResult, ProviderAdapter, http_client, raw_body, resolve_model, send_json,
    trim_base_url,
};
use crate::error::ProviderError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const VENDOR: &str = "OpenAI";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
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
impl ProviderAdapter for OpenAiProvider {
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
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&ChatRequest::new(Some(model), prompt));

        let response: ChatResponse = send_json(VENDOR, request, cancel, raw_body).await?;
        Ok(response.into_result(model))
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
