//! llmessage - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use llmessage::commands::generate::{GenerateOptions, SinkKind, run_generate};
use llmessage::commands::profile::{self as profile_cmd, AddProfile};
use llmessage::commands::{Workspace, diagnose};
use llmessage::config::store::ProfileUpdate;
use llmessage::notify::{Notifier, TerminalNotifier};
use llmessage::{CommitStyle, Outcome, ProviderKind};

/// Generate commit messages from your git diff with the AI provider of your choice.
#[derive(Parser, Debug)]
#[command(name = "llmessage")]
#[command(about = "Generate commit messages from your git diff with AI")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    generate: GenerateArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a commit message (the default)
    Generate(GenerateArgs),

    /// Manage profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Pin a profile to the current repository
    #[command(subcommand)]
    Workspace(WorkspaceCommand),

    /// Manage stored API keys
    #[command(subcommand)]
    Key(KeyCommand),

    /// Check that the active profile's provider is reachable
    Check,

    /// Print diagnostic information
    Debug,
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// Where to put the message
    #[arg(long, value_enum, default_value_t = SinkKind::Stdout)]
    sink: SinkKind,

    /// Use this profile instead of the active one
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// List profiles (* marks the active one)
    List,

    /// Show the active profile
    Show,

    /// Create a profile and make it active
    Add {
        /// Profile name
        alias: Option<String>,
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,
        /// Model name; empty uses the provider default
        #[arg(long)]
        model: Option<String>,
        #[arg(long, value_enum)]
        style: Option<CommitStyle>,
        #[arg(long)]
        locale: Option<String>,
        /// Read the API key from stdin
        #[arg(long)]
        key_stdin: bool,
    },

    /// Delete a profile and its API key
    Remove {
        alias: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Make a profile the active one
    Switch { alias: Option<String> },

    /// Rename a profile
    Rename { from: String, to: Option<String> },

    /// Change a profile's settings
    Edit {
        /// Defaults to the active profile
        alias: Option<String>,
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, value_enum)]
        style: Option<CommitStyle>,
        #[arg(long)]
        locale: Option<String>,
    },

    /// Set a custom prompt ({{diff}} and {{locale}} are filled in)
    Prompt {
        /// Defaults to the active profile
        alias: Option<String>,
        /// Prompt text; opens an editor when neither this nor --file is given
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    /// Use a profile for this repository
    Set { alias: Option<String> },
    /// Go back to the global profile
    Clear,
    /// Pin the active profile, or clear the pin
    Toggle,
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Store a profile's API key
    Set {
        alias: String,
        /// Read the key from stdin
        #[arg(long)]
        stdin: bool,
    },
    /// Delete a profile's API key
    Remove { alias: String },
}

/// Exit status for a cancelled run, as a shell reports SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Cannot read the current directory")?;
    let workspace = Workspace::discover(&cwd).context("Failed to locate configuration")?;
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier::default());

    match cli.command {
        None => generate(&workspace, cli.generate, notifier.as_ref()).await,
        Some(Command::Generate(args)) => generate(&workspace, args, notifier.as_ref()).await,
        Some(Command::Profile(command)) => {
            run_profile(&workspace, command, notifier)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Workspace(command)) => {
            let store = workspace.store(notifier);
            match command {
                WorkspaceCommand::Set { alias } => profile_cmd::workspace_set(&store, alias)?,
                WorkspaceCommand::Clear => profile_cmd::workspace_clear(&store)?,
                WorkspaceCommand::Toggle => {
                    profile_cmd::workspace_toggle(&store)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Key(command)) => {
            let secrets = workspace.secrets();
            match command {
                KeyCommand::Set { alias, stdin } => {
                    profile_cmd::key_set(&workspace, &secrets, &alias, stdin)?;
                    notifier.info(&format!("Saved API key for \"{alias}\""));
                }
                KeyCommand::Remove { alias } => {
                    profile_cmd::key_remove(&secrets, &alias)?;
                    notifier.info(&format!("Removed API key for \"{alias}\""));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Check) => {
            let report = diagnose::check(&workspace, &workspace.secrets())
                .await
                .context("Cannot check the active profile")?;
            println!("{}", report.summary());
            Ok(if report.available {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Command::Debug) => {
            println!("{}", diagnose::debug_report(&workspace).await);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr; stdout carries only the generated message.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn generate(
    workspace: &Workspace,
    args: GenerateArgs,
    notifier: &dyn Notifier,
) -> Result<ExitCode> {
    // Ctrl-C fires the user cancellation token instead of killing the process.
    let user_cancel = CancellationToken::new();
    let trigger = user_cancel.clone();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            trigger.cancel();
        }
    });

    let options = GenerateOptions {
        sink: args.sink,
        profile: args.profile,
    };
    let result = run_generate(workspace, options, user_cancel, notifier).await;
    listener.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            notifier.error(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    Ok(match outcome {
        Outcome::Completed { .. } => ExitCode::SUCCESS,
        Outcome::Cancelled => ExitCode::from(EXIT_CANCELLED),
        Outcome::Empty { .. } | Outcome::TimedOut { .. } => ExitCode::FAILURE,
    })
}

fn run_profile(
    workspace: &Workspace,
    command: ProfileCommand,
    notifier: Arc<dyn Notifier>,
) -> Result<()> {
    let secrets = workspace.secrets();
    let store = workspace.store(notifier);

    match command {
        ProfileCommand::List => println!("{}", profile_cmd::list(workspace)?),
        ProfileCommand::Show => println!("{}", profile_cmd::show(workspace, &secrets)?),
        ProfileCommand::Add {
            alias,
            provider,
            model,
            style,
            locale,
            key_stdin,
        } => {
            profile_cmd::add(
                &store,
                &secrets,
                AddProfile {
                    alias,
                    provider,
                    model,
                    commit_style: style,
                    locale,
                    api_key_stdin: key_stdin,
                },
            )?;
        }
        ProfileCommand::Remove { alias, yes } => {
            profile_cmd::remove(&store, &secrets, &alias, yes)?
        }
        ProfileCommand::Switch { alias } => profile_cmd::switch(&store, alias)?,
        ProfileCommand::Rename { from, to } => {
            profile_cmd::rename(&store, &secrets, &from, to)?;
        }
        ProfileCommand::Edit {
            alias,
            provider,
            model,
            style,
            locale,
        } => {
            let update = ProfileUpdate {
                provider,
                model,
                commit_style: style,
                custom_prompt: None,
                locale,
            };
            profile_cmd::edit(&store, alias, update)?;
        }
        ProfileCommand::Prompt { alias, text, file } => {
            profile_cmd::set_prompt(&store, alias, text, file.as_deref())?
        }
    }
    Ok(())
}
