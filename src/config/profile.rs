//! Profile records: provider, model, commit style and locale under an alias.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
    Local,
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Local,
        ProviderKind::Custom,
    ];

    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Local => "local",
            ProviderKind::Custom => "custom",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::Local => "Local (Ollama, LM Studio, etc.)",
            ProviderKind::Custom => "Custom Endpoint",
        }
    }

    /// Every backend except the local one authenticates with a stored key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }

    /// Models offered when picking interactively. Custom endpoints have none.
    pub fn suggested_models(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-4.1", "gpt-4.1-mini", "o3-mini"],
            ProviderKind::Anthropic => &[
                "claude-sonnet-4-20250514",
                "claude-opus-4-20250514",
                "claude-haiku-3-5-20241022",
            ],
            ProviderKind::Gemini => &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"],
            ProviderKind::Local => &["llama3.2", "llama3.1", "mistral", "qwen2.5-coder"],
            ProviderKind::Custom => &[],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum CommitStyle {
    /// Conventional commit written in the profile's locale.
    #[default]
    #[serde(rename = "conventional")]
    Conventional,
    /// Conventional commit, always English.
    #[serde(rename = "conventionalEn")]
    #[value(name = "conventional-en")]
    ConventionalEn,
    /// The profile's own prompt.
    #[serde(rename = "custom")]
    Custom,
}

impl CommitStyle {
    pub const ALL: [CommitStyle; 3] = [
        CommitStyle::Conventional,
        CommitStyle::ConventionalEn,
        CommitStyle::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStyle::Conventional => "conventional",
            CommitStyle::ConventionalEn => "conventionalEn",
            CommitStyle::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommitStyle::Conventional => "Conventional (Locale)",
            CommitStyle::ConventionalEn => "Conventional (English)",
            CommitStyle::Custom => "Custom Prompt",
        }
    }
}

fn default_locale() -> String {
    "en".to_string()
}

/// A saved profile. Fields missing from older config files fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Empty means "let the provider pick its default".
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub commit_style: CommitStyle,
    #[serde(default)]
    pub custom_prompt: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: String::new(),
            commit_style: CommitStyle::default(),
            custom_prompt: String::new(),
            locale: default_locale(),
        }
    }
}

impl Profile {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    /// Model for display: the configured one, or `default`.
    pub fn model_label(&self) -> &str {
        if self.model.is_empty() {
            "default"
        } else {
            &self.model
        }
    }

    /// Model override handed to the provider; `None` when the profile leaves it blank.
    pub fn model_override(&self) -> Option<String> {
        let model = self.model.trim();
        (!model.is_empty()).then(|| model.to_string())
    }
}

/// A profile together with the alias it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProfile {
    pub alias: String,
    pub profile: Profile,
}
