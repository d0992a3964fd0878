//! `llmessage generate`.

use tokio_util::sync::CancellationToken;

use crate::commands::Workspace;
use crate::dispatch::{Dispatcher, Outcome, ProfileResolver};
use crate::error::GenerateError;
use crate::git::diff::RepoDiffProvider;
use crate::git::sink::{CommitMessageSink, CommitSink, EditMsgSink, StdoutSink};
use crate::notify::Notifier;
use crate::prompt::PromptOptions;

/// Destination for the generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SinkKind {
    /// Print it.
    #[default]
    Stdout,
    /// Write `.git/COMMIT_EDITMSG`.
    EditMsg,
    /// Commit the staged changes with it.
    Commit,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub sink: SinkKind,
    /// Profile to use instead of the effective one.
    pub profile: Option<String>,
}

pub async fn run_generate(
    workspace: &Workspace,
    options: GenerateOptions,
    user_cancel: CancellationToken,
    notifier: &dyn Notifier,
) -> Result<Outcome, GenerateError> {
    let settings = workspace.settings()?;
    let prompt_options = match &options.profile {
        Some(alias) => settings.profile(alias).map(PromptOptions::from_profile),
        None => settings
            .active()
            .map(|active| PromptOptions::from_profile(active.profile)),
    }
    .unwrap_or_default();

    let secrets = workspace.secrets();
    let resolver =
        ProfileResolver::new(workspace.paths.clone(), &secrets).with_alias(options.profile);
    let diff = RepoDiffProvider::new(&workspace.cwd);
    let sink: Box<dyn CommitMessageSink> = match options.sink {
        SinkKind::Stdout => Box::new(StdoutSink),
        SinkKind::EditMsg => Box::new(EditMsgSink::new(&workspace.cwd)),
        SinkKind::Commit => Box::new(CommitSink::new(&workspace.cwd)),
    };

    Dispatcher::new(&diff, &resolver, sink.as_ref(), notifier)
        .with_prompt_options(prompt_options)
        .run(user_cancel)
        .await
}
