//! Any OpenAI-compatible endpoint.
//!
//! The key is optional here: an empty key sends no `Authorization` header,
//! and an empty model is left out of the request body entirely.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::chat::{ChatRequest, ChatResponse};
use super::{GenerateResult, ProviderAdapter, http_client, raw_body, send_json, trim_base_url};
use crate::error::ProviderError;

/// Reported model when neither the caller, the config, nor the server names one.
pub const UNKNOWN_MODEL: &str = "unknown";

const VENDOR: &str = "Custom";

pub struct CustomProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl CustomProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            base_url: trim_base_url(base_url),
            default_model: default_model.into().trim().to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for CustomProvider {
    fn name(&self) -> &'static str {
        VENDOR
    }

    async fn generate_message(
        &self,
        prompt: &str,
        model: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<GenerateResult, ProviderError> {
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| Some(self.default_model.as_str()).filter(|m| !m.is_empty()));

        let mut request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&ChatRequest::new(model, prompt));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response: ChatResponse = send_json(VENDOR, request, cancel, raw_body).await?;
        Ok(response.into_result(model.unwrap_or(UNKNOWN_MODEL)))
    }

    async fn is_available(&self) -> bool {
        !self.base_url.is_empty()
    }
}
