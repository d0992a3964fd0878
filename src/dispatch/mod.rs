//! One generate invocation: diff → prompt → provider → sink.
//!
//! The dispatcher owns the timeout and cancellation contract. A fixed timer
//! and the user's cancellation token both feed a single abort signal handed
//! to the adapter; whichever fires first is recorded as the reason and the
//! other becomes a no-op.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::secrets::SecretStore;
use crate::config::settings::{ConfigPaths, Settings};
use crate::error::{ConfigError, GenerateError, ProviderError};
use crate::git::diff::DiffProvider;
use crate::git::sink::CommitMessageSink;
use crate::notify::Notifier;
use crate::prompt::{PromptOptions, build_prompt};
use crate::provider::{ResolvedProvider, create_provider, create_provider_for};

/// How long a provider gets before the request is aborted.
pub const GENERATION_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Why the shared signal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    UserCancelled,
    TimedOut,
}

/// A cancellation signal that remembers its first trigger.
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    signal: CancellationToken,
    reason: Arc<OnceLock<AbortReason>>,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> &CancellationToken {
        &self.signal
    }

    /// Fire the signal. Returns `true` only for the first call.
    pub fn abort(&self, reason: AbortReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        if first {
            debug!("Aborting generation: {:?}", reason);
        }
        self.signal.cancel();
        first
    }

    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.get().copied()
    }
}

/// Background task racing the timer against user cancellation.
/// Dropping it stops both listeners.
struct AbortWatch {
    task: JoinHandle<()>,
}

impl AbortWatch {
    fn spawn(controller: AbortController, user_cancel: CancellationToken, timeout: Duration) -> Self {
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = user_cancel.cancelled() => {
                    controller.abort(AbortReason::UserCancelled);
                }
                _ = tokio::time::sleep(timeout) => {
                    controller.abort(AbortReason::TimedOut);
                }
                _ = controller.signal().cancelled() => {}
            }
        });
        Self { task }
    }
}

impl Drop for AbortWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Produces the adapter for one invocation.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self) -> Result<ResolvedProvider, ConfigError>;
}

/// Reads the config fresh on every call, so profile edits apply immediately.
pub struct ProfileResolver<'a> {
    paths: ConfigPaths,
    secrets: &'a dyn SecretStore,
    alias: Option<String>,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(paths: ConfigPaths, secrets: &'a dyn SecretStore) -> Self {
        Self {
            paths,
            secrets,
            alias: None,
        }
    }

    /// Use this profile instead of the effective one.
    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }
}

impl ProviderResolver for ProfileResolver<'_> {
    fn resolve(&self) -> Result<ResolvedProvider, ConfigError> {
        let settings = Settings::load(&self.paths)?;
        match &self.alias {
            Some(alias) => create_provider_for(alias, &settings, self.secrets),
            None => create_provider(&settings, self.secrets),
        }
    }
}

/// Stage of an invocation, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CollectingDiff,
    BuildingPrompt,
    Dispatching,
    Completed,
    Cancelled,
    TimedOut,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::CollectingDiff => "collecting diff",
            Phase::BuildingPrompt => "building prompt",
            Phase::Dispatching => "dispatching",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
            Phase::TimedOut => "timed out",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How an invocation ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A message reached the sink.
    Completed {
        message: String,
        model: String,
        profile_alias: String,
        truncated: bool,
    },
    /// The provider answered with nothing; the sink was not touched.
    Empty { model: String, profile_alias: String },
    Cancelled,
    TimedOut { timeout_ms: u128 },
}

/// Drives a single generate invocation.
pub struct Dispatcher<'a> {
    diff: &'a dyn DiffProvider,
    resolver: &'a dyn ProviderResolver,
    sink: &'a dyn CommitMessageSink,
    notifier: &'a dyn Notifier,
    prompt_options: PromptOptions,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        diff: &'a dyn DiffProvider,
        resolver: &'a dyn ProviderResolver,
        sink: &'a dyn CommitMessageSink,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            diff,
            resolver,
            sink,
            notifier,
            prompt_options: PromptOptions::default(),
        }
    }

    pub fn with_prompt_options(mut self, options: PromptOptions) -> Self {
        self.prompt_options = options;
        self
    }

    /// Run one invocation. `user_cancel` may fire at any point.
    ///
    /// Errors are the `Failed` state and carry the underlying cause verbatim.
    pub async fn run(&self, user_cancel: CancellationToken) -> Result<Outcome, GenerateError> {
        let result = self.drive(&user_cancel).await;
        match &result {
            Ok(outcome) => self.enter(match outcome {
                Outcome::Completed { .. } | Outcome::Empty { .. } => Phase::Completed,
                Outcome::Cancelled => Phase::Cancelled,
                Outcome::TimedOut { .. } => Phase::TimedOut,
            }),
            Err(e) => {
                self.enter(Phase::Failed);
                debug!("Generation failed: {}", e);
            }
        }
        result
    }

    async fn drive(&self, user_cancel: &CancellationToken) -> Result<Outcome, GenerateError> {
        self.enter(Phase::Idle);

        self.enter(Phase::CollectingDiff);
        let snapshot = self.diff.collect().await?;
        if user_cancel.is_cancelled() {
            self.notifier.info("Cancelled.");
            return Ok(Outcome::Cancelled);
        }

        self.enter(Phase::BuildingPrompt);
        let prompt = build_prompt(&snapshot.text, &self.prompt_options)?;

        self.enter(Phase::Dispatching);
        let ResolvedProvider {
            provider,
            model_override,
            profile_alias,
        } = self.resolver.resolve()?;

        let controller = AbortController::new();
        let watch = AbortWatch::spawn(controller.clone(), user_cancel.clone(), GENERATION_TIMEOUT);
        let result = provider
            .generate_message(&prompt, model_override.as_deref(), controller.signal())
            .await;
        drop(watch);

        let result = match result {
            Ok(result) => result,
            Err(ProviderError::Aborted) => return Ok(self.aborted(&controller)),
            Err(e) => return Err(e.into()),
        };

        // A reply that raced a user cancel is dropped without a word.
        if user_cancel.is_cancelled() {
            debug!("Discarding reply received after cancellation");
            return Ok(Outcome::Cancelled);
        }

        if result.message.is_empty() {
            self.notifier.warn("AI returned an empty message.");
            return Ok(Outcome::Empty {
                model: result.model,
                profile_alias,
            });
        }

        self.sink.deliver(&result.message, snapshot.source)?;

        if result.truncated {
            self.notifier.warn(&format!(
                "[{}] {} response was truncated. Try a shorter diff or reduce output verbosity in your prompt.",
                profile_alias, result.model
            ));
        } else {
            self.notifier
                .info(&format!("[{}] {}", profile_alias, result.model));
        }

        Ok(Outcome::Completed {
            message: result.message,
            model: result.model,
            profile_alias,
            truncated: result.truncated,
        })
    }

    fn aborted(&self, controller: &AbortController) -> Outcome {
        match controller.reason() {
            Some(AbortReason::TimedOut) => {
                let timeout_ms = GENERATION_TIMEOUT.as_millis();
                self.notifier.error(&format!(
                    "Request timed out ({}ms). Try a faster model or shorter diff.",
                    timeout_ms
                ));
                Outcome::TimedOut { timeout_ms }
            }
            Some(AbortReason::UserCancelled) | None => {
                self.notifier.info("Cancelled.");
                Outcome::Cancelled
            }
        }
    }

    fn enter(&self, phase: Phase) {
        debug!("generate: {}", phase);
    }
}
