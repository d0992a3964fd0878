//! llmessage - A CLI tool that turns a staged git diff into an AI-written commit message.
//!
//! # Overview
//!
//! llmessage keeps named profiles (provider, model, prompt style, locale),
//! stores an API key per profile, and sends the diff to one of five
//! text-generation backends: OpenAI, Anthropic, Gemini, a local Ollama-style
//! server, or any OpenAI-compatible endpoint. The [`dispatch`] module owns the
//! timeout and cancellation contract shared by every backend.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod notify;
pub mod prompt;
pub mod provider;
pub mod view;

// Re-export commonly used types
pub use config::{CommitStyle, Profile, ProviderKind, Settings};
pub use dispatch::{Dispatcher, Outcome};
pub use error::{
    CommandError, ConfigError, DiffError, GenerateError, PromptError, ProviderError, SecretError,
    SinkError,
};
pub use provider::{GenerateResult, ProviderAdapter};
