//! Error types for llmessage modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from configuration and profile resolution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No active profile. Run \"llmessage profile add\" first.")]
    NoActiveProfile,

    #[error(
        "API key not found for profile \"{0}\". Run \"llmessage key set {0}\" or re-add the profile."
    )]
    MissingApiKey(String),

    #[error(
        "Custom endpoint URL not configured. Set \"custom.url\" in the llmessage config file."
    )]
    MissingCustomUrl,

    #[error("Profile \"{0}\" does not exist")]
    UnknownProfile(String),

    #[error("Profile \"{0}\" already exists")]
    ProfileExists(String),

    #[error("Profile name cannot be empty")]
    EmptyAlias,

    #[error("Profile \"{alias}\" is invalid: {detail}")]
    InvalidProfile { alias: String, detail: String },

    #[error("Not inside a git work tree; project-level profiles need a repository")]
    NoWorkspace,

    #[error("Could not determine a config directory. Set LLMESSAGE_CONFIG_DIR.")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to edit {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Secret(#[from] SecretError),
}

/// Errors from the per-profile secret store.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("API key cannot be empty")]
    EmptyKey,

    #[error("Failed to read secrets from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secrets file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write secrets to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a provider HTTP round trip.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{vendor} API error ({status}): {message}")]
    Api {
        vendor: &'static str,
        status: u16,
        message: String,
    },

    #[error("{vendor} request failed: {source}")]
    Network {
        vendor: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{vendor} returned an unreadable response: {detail}")]
    InvalidResponse { vendor: &'static str, detail: String },

    #[error("Request aborted")]
    Aborted,
}

impl ProviderError {
    /// HTTP status of a vendor rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from collecting the diff to describe.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("No Git repository found: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Repository has no working tree")]
    BareRepository,

    #[error("No changes detected. Stage some changes first.")]
    NoChanges,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Diff collection was interrupted: {0}")]
    Interrupted(String),
}

/// Errors from prompt construction.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error(
        "Custom commit style selected but no custom prompt configured. Edit the profile to set a custom prompt."
    )]
    MissingCustomPrompt,
}

/// Errors from delivering a generated message.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write commit message: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    SignatureMissing(#[source] git2::Error),
}

/// Errors from the profile, workspace and key subcommands.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("Interactive input failed: {0}")]
    Interaction(#[from] dialoguer::Error),

    #[error("Failed to read {what}: {source}")]
    ReadInput {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Cancelled.")]
    Cancelled,
}

/// Errors that end a generate invocation in the failed state.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
