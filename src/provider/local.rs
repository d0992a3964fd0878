//! Local Ollama-style server (`/api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::chat::Message;
use super::{
    GenerateResult, ProviderAdapter, http_client, raw_body, reported_model, resolve_model,
    send_json, trim_base_url,
};
use crate::error::ProviderError;

pub const DEFAULT_MODEL: &str = "llama3.2";

/// How long the readiness probe waits for `/api/tags`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const VENDOR: &str = "Local";

#[derive(Serialize)]
struct LocalChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    stream: bool,
}

#[derive(Default, Deserialize)]
struct LocalChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<LocalMessage>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct LocalMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct LocalProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LocalProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: trim_base_url(base_url),
        }
    }
}

#[async_trait]
impl ProviderAdapter for LocalProvider {
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
            .post(format!("{}/api/chat", self.base_url))
            .json(&LocalChatRequest {
                model,
                messages: [Message::user(prompt)],
                stream: false,
            });

        let response: LocalChatResponse = send_json(VENDOR, request, cancel, raw_body).await?;

        Ok(GenerateResult {
            message: response
                .message
                .and_then(|m| m.content)
                .map(|c| c.trim().to_string())
                .unwrap_or_default(),
            model: reported_model(response.model, model),
            truncated: response.done_reason.as_deref() == Some("length"),
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Local server probe failed: {}", e);
                false
            }
        }
    }
}
