//! Subcommand implementations behind the CLI.

pub mod diagnose;
pub mod generate;
pub mod profile;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::Repository;
use tracing::debug;

use crate::config::secrets::FileSecretStore;
use crate::config::settings::{ConfigPaths, Settings};
use crate::config::store::{ProfileEvent, ProfileStore};
use crate::error::ConfigError;
use crate::notify::Notifier;

/// Where the command runs and which files it uses.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub cwd: PathBuf,
    /// Work-tree root of the enclosing repository, if any.
    pub root: Option<PathBuf>,
    pub paths: ConfigPaths,
}

impl Workspace {
    pub fn discover(cwd: &Path) -> Result<Self, ConfigError> {
        let root = find_work_tree(cwd);
        let paths = ConfigPaths::discover(root.as_deref())?;
        debug!(
            "Workspace root {:?}, config {}",
            root,
            paths.config_file.display()
        );
        Ok(Self {
            cwd: cwd.to_path_buf(),
            root,
            paths,
        })
    }

    pub fn with_paths(cwd: &Path, paths: ConfigPaths) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            root: find_work_tree(cwd),
            paths,
        }
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Settings::load(&self.paths)
    }

    pub fn secrets(&self) -> FileSecretStore {
        FileSecretStore::new(&self.paths.secrets_file)
    }

    /// Profile store that reports each change through `notifier`.
    pub fn store(&self, notifier: Arc<dyn Notifier>) -> ProfileStore {
        let mut store = ProfileStore::new(self.paths.clone());
        store.subscribe(move |event: &ProfileEvent, settings: &Settings| {
            notifier.info(&describe_change(event, settings));
        });
        store
    }
}

fn find_work_tree(cwd: &Path) -> Option<PathBuf> {
    Repository::discover(cwd)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
}

/// One-line summary of a profile change.
pub fn describe_change(event: &ProfileEvent, settings: &Settings) -> String {
    let active = settings
        .active()
        .map(|a| format!("{} ({})", a.alias, a.scope.label()))
        .unwrap_or_else(|| "none".to_string());

    match event {
        ProfileEvent::Added(alias) => format!("Added profile \"{alias}\". Active: {active}"),
        ProfileEvent::Removed(alias) => format!("Removed profile \"{alias}\". Active: {active}"),
        ProfileEvent::Switched(alias) => format!("Switched to \"{alias}\". Active: {active}"),
        ProfileEvent::Renamed { from, to } => format!("Renamed \"{from}\" to \"{to}\""),
        ProfileEvent::Updated(alias) => format!("Updated profile \"{alias}\""),
        ProfileEvent::WorkspacePinned(alias) => {
            format!("Pinned \"{alias}\" to this repository")
        }
        ProfileEvent::WorkspaceCleared => {
            format!("Cleared the repository profile. Active: {active}")
        }
    }
}
