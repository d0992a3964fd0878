//! Vendor adapters behind one `ProviderAdapter` trait.
//!
//! Each adapter turns a prompt plus an optional model name into exactly one
//! HTTP request and maps the vendor's JSON reply into a [`GenerateResult`].
//! Adapters never retry and never cache; timeouts and user cancellation are
//! owned by the dispatcher and arrive here as a shared [`CancellationToken`].

pub mod anthropic;
mod chat;
pub mod custom;
pub mod factory;
pub mod gemini;
pub mod local;
pub mod openai;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ProviderError;

pub use anthropic::AnthropicProvider;
pub use custom::CustomProvider;
pub use factory::{ResolvedProvider, create_provider, create_provider_for};
pub use gemini::GeminiProvider;
pub use local::LocalProvider;
pub use openai::OpenAiProvider;

/// Sampling temperature sent to every vendor that accepts one.
pub(crate) const TEMPERATURE: f64 = 0.4;

/// Output cap for the chat-style vendors.
pub(crate) const MAX_TOKENS: u32 = 300;

/// Normalized reply from any vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    /// Trimmed completion text; empty when the vendor sent none.
    pub message: String,
    /// Vendor-reported model, else the model that was requested.
    pub model: String,
    /// The vendor stopped because it hit its output limit.
    pub truncated: bool,
}

/// One text-generation backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Send one generation request.
    ///
    /// `model` of `None` (or blank) selects the adapter's default. Fails with
    /// [`ProviderError::Aborted`] as soon as `cancel` fires.
    async fn generate_message(
        &self,
        prompt: &str,
        model: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<GenerateResult, ProviderError>;

    /// Cheap readiness probe. Never fails; problems read as `false`.
    async fn is_available(&self) -> bool;
}

/// Requested model if non-blank, else the adapter default.
pub(crate) fn resolve_model<'a>(requested: Option<&'a str>, default: &'a str) -> &'a str {
    requested
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default)
}

/// Base URL without trailing slashes.
pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Vendor-reported model when present, else the fallback.
pub(crate) fn reported_model(reported: Option<String>, fallback: &str) -> String {
    reported
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Shared HTTP client. Timeouts are enforced by the dispatcher, not here.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Send `request` and decode a 2xx JSON body as `T`.
///
/// Non-2xx replies become [`ProviderError::Api`] with the body passed through
/// `describe_error`. The whole exchange races `cancel`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    vendor: &'static str,
    request: RequestBuilder,
    cancel: &CancellationToken,
    describe_error: fn(String) -> String,
) -> Result<T, ProviderError> {
    let exchange = async {
        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Network { vendor, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ProviderError::Network { vendor, source })?;
        debug!("{} responded {} ({} bytes)", vendor, status, body.len());

        if !status.is_success() {
            return Err(ProviderError::Api {
                vendor,
                status: status.as_u16(),
                message: describe_error(body),
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| ProviderError::InvalidResponse {
            vendor,
            detail: e.to_string(),
        })
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("{} request aborted", vendor);
            Err(ProviderError::Aborted)
        }
        result = exchange => result,
    }
}

/// Error bodies are reported as-is.
pub(crate) fn raw_body(body: String) -> String {
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_blank_uses_default() {
        assert_eq!(resolve_model(None, "d"), "d");
        assert_eq!(resolve_model(Some(""), "d"), "d");
        assert_eq!(resolve_model(Some("   "), "d"), "d");
        assert_eq!(resolve_model(Some("gpt-4o"), "d"), "gpt-4o");
    }

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("http://host:1234///"), "http://host:1234");
        assert_eq!(trim_base_url("http://host"), "http://host");
    }

    #[test]
    fn test_reported_model_fallback() {
        assert_eq!(reported_model(Some("m-1".into()), "x"), "m-1");
        assert_eq!(reported_model(Some(String::new()), "x"), "x");
        assert_eq!(reported_model(None, "x"), "x");
    }

    #[tokio::test]
    async fn test_send_json_pre_cancelled_never_sends() {
        let server = wiremock::MockServer::start().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = http_client().post(format!("{}/x", server.uri()));
        let result: Result<serde_json::Value, _> =
            send_json("Test", request, &cancel, raw_body).await;

        assert!(matches!(result, Err(ProviderError::Aborted)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
