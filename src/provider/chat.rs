//! OpenAI-compatible chat completion wire types, shared by the OpenAI and
//! custom-endpoint adapters.

use serde::{Deserialize, Serialize};

use super::{GenerateResult, MAX_TOKENS, TEMPERATURE, reported_model};

#[derive(Debug, Serialize)]
pub(crate) struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> Message<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: [Message<'a>; 1],
    pub temperature: f64,
    pub max_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: Option<&'a str>, prompt: &'a str) -> Self {
        Self {
            model,
            messages: [Message::user(prompt)],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's text; `finish_reason == "length"` marks truncation.
    pub fn into_result(self, fallback_model: &str) -> GenerateResult {
        let first = self.choices.into_iter().next().unwrap_or_default();
        let truncated = first.finish_reason.as_deref() == Some("length");
        let message = first
            .message
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        GenerateResult {
            message,
            model: reported_model(self.model, fallback_model),
            truncated,
        }
    }
}
