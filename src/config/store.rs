//! Profile create/edit/remove with format-preserving TOML writes.
//!
//! Every mutation re-reads the file, edits the `toml_edit` document in place
//! (so user comments and layout survive), writes it back atomically and then
//! notifies registered observers.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml_edit::{DocumentMut, Item, Table, value};
use tracing::{debug, info, warn};

use crate::config::profile::{CommitStyle, Profile, ProviderKind};
use crate::config::secrets::SecretStore;
use crate::config::settings::{ConfigPaths, Settings};
use crate::error::ConfigError;

/// What changed in the profile configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    Added(String),
    Removed(String),
    Switched(String),
    Renamed { from: String, to: String },
    Updated(String),
    WorkspacePinned(String),
    WorkspaceCleared,
}

/// Receives profile change notifications.
pub trait ProfileObserver {
    fn profiles_changed(&self, event: &ProfileEvent, settings: &Settings);
}

impl<F> ProfileObserver for F
where
    F: Fn(&ProfileEvent, &Settings),
{
    fn profiles_changed(&self, event: &ProfileEvent, settings: &Settings) {
        self(event, settings)
    }
}

/// Partial edit of an existing profile. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub commit_style: Option<CommitStyle>,
    pub custom_prompt: Option<String>,
    pub locale: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.model.is_none()
            && self.commit_style.is_none()
            && self.custom_prompt.is_none()
            && self.locale.is_none()
    }
}

/// Mutating front end over the config files.
pub struct ProfileStore {
    paths: ConfigPaths,
    observers: Vec<Box<dyn ProfileObserver>>,
}

impl ProfileStore {
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            observers: Vec::new(),
        }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Register an observer notified after every successful mutation.
    pub fn subscribe(&mut self, observer: impl ProfileObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Settings::load(&self.paths)
    }

    /// Save a new profile and make it the globally active one.
    pub fn add(&self, alias: &str, profile: &Profile) -> Result<String, ConfigError> {
        let alias = normalize_alias(alias)?;
        let settings = self.settings()?;
        if settings.contains(&alias) {
            return Err(ConfigError::ProfileExists(alias));
        }

        let mut doc = self.open_global()?;
        profiles_table(&mut doc).insert(&alias, Item::Table(profile_table(profile)));
        doc["active_profile"] = value(alias.as_str());
        self.write_global(&doc)?;

        info!("Added profile \"{}\" ({})", alias, profile.provider);
        self.notify(ProfileEvent::Added(alias.clone()))?;
        Ok(alias)
    }

    /// Delete a profile and its stored key.
    ///
    /// When the removed profile was globally active, the first remaining
    /// profile (in file order) becomes active, or none if it was the last.
    pub fn remove(&self, alias: &str, secrets: &dyn SecretStore) -> Result<(), ConfigError> {
        let settings = self.settings()?;
        if !settings.contains(alias) {
            return Err(ConfigError::UnknownProfile(alias.to_string()));
        }

        let mut doc = self.open_global()?;
        profiles_table(&mut doc).remove(alias);
        if settings.active_profile == alias {
            let next = settings
                .aliases()
                .find(|a| *a != alias)
                .unwrap_or_default()
                .to_string();
            debug!("Active profile removed; promoting {:?}", next);
            doc["active_profile"] = value(next);
        }
        self.write_global(&doc)?;

        if settings.workspace_profile == alias {
            self.write_workspace_pin(None)?;
        }

        // The profile is gone either way; a leftover key is harmless.
        if let Err(e) = secrets.remove(alias) {
            warn!("Removed profile \"{}\" but could not delete its API key: {}", alias, e);
        }

        info!("Removed profile \"{}\"", alias);
        self.notify(ProfileEvent::Removed(alias.to_string()))
    }

    /// Make an existing profile the globally active one.
    pub fn switch(&self, alias: &str) -> Result<(), ConfigError> {
        self.require(alias)?;
        let mut doc = self.open_global()?;
        doc["active_profile"] = value(alias);
        self.write_global(&doc)?;
        self.notify(ProfileEvent::Switched(alias.to_string()))
    }

    /// Rename a profile, carrying its stored key and any active/pinned references.
    pub fn rename(
        &self,
        from: &str,
        to: &str,
        secrets: &dyn SecretStore,
    ) -> Result<String, ConfigError> {
        let to = normalize_alias(to)?;
        let settings = self.settings()?;
        let profile = settings
            .profile(from)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProfile(from.to_string()))?;
        if to == from {
            return Ok(to);
        }
        if settings.contains(&to) {
            return Err(ConfigError::ProfileExists(to));
        }

        // Copy the key first so the renamed profile is never keyless.
        let key = secrets.get(from)?;
        if let Some(key) = &key {
            secrets.set(&to, key)?;
        }

        let mut doc = self.open_global()?;
        let table = profiles_table(&mut doc);
        let item = table
            .remove(from)
            .unwrap_or_else(|| Item::Table(profile_table(&profile)));
        table.insert(&to, item);
        if settings.active_profile == from {
            doc["active_profile"] = value(to.as_str());
        }
        let written = self.write_global(&doc).and_then(|()| {
            if settings.workspace_profile == from {
                self.write_workspace_pin(Some(&to))
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            if key.is_some() {
                if let Err(rollback) = secrets.remove(&to) {
                    warn!("Failed to drop copied API key for \"{}\": {}", to, rollback);
                }
            }
            return Err(e);
        }

        if key.is_some() {
            if let Err(e) = secrets.remove(from) {
                warn!("Renamed profile but could not delete the old API key \"{}\": {}", from, e);
            }
        }

        info!("Renamed profile \"{}\" -> \"{}\"", from, to);
        self.notify(ProfileEvent::Renamed {
            from: from.to_string(),
            to: to.clone(),
        })?;
        Ok(to)
    }

    /// Apply a partial edit to a profile.
    pub fn update(&self, alias: &str, update: &ProfileUpdate) -> Result<Profile, ConfigError> {
        let mut profile = self.require(alias)?;
        if let Some(provider) = update.provider {
            profile.provider = provider;
        }
        if let Some(model) = &update.model {
            profile.model = model.trim().to_string();
        }
        if let Some(style) = update.commit_style {
            profile.commit_style = style;
        }
        if let Some(prompt) = &update.custom_prompt {
            profile.custom_prompt = prompt.clone();
        }
        if let Some(locale) = &update.locale {
            profile.locale = locale.trim().to_string();
        }

        let mut doc = self.open_global()?;
        let table = profiles_table(&mut doc);
        match table.get_mut(alias).and_then(Item::as_table_mut) {
            // Edit in place to keep comments inside the profile's table.
            Some(existing) => write_profile_fields(existing, &profile),
            None => {
                table.insert(alias, Item::Table(profile_table(&profile)));
            }
        }
        self.write_global(&doc)?;

        self.notify(ProfileEvent::Updated(alias.to_string()))?;
        Ok(profile)
    }

    /// Pin a profile to the current repository.
    pub fn set_workspace(&self, alias: &str) -> Result<(), ConfigError> {
        self.require(alias)?;
        self.write_workspace_pin(Some(alias))?;
        self.notify(ProfileEvent::WorkspacePinned(alias.to_string()))
    }

    /// Drop the repository pin and fall back to the global profile.
    pub fn clear_workspace(&self) -> Result<(), ConfigError> {
        self.write_workspace_pin(None)?;
        self.notify(ProfileEvent::WorkspaceCleared)
    }

    /// Clear the pin if one exists, otherwise pin the effective profile.
    pub fn toggle_scope(&self) -> Result<ProfileEvent, ConfigError> {
        let settings = self.settings()?;
        if !settings.workspace_profile.trim().is_empty() {
            self.clear_workspace()?;
            return Ok(ProfileEvent::WorkspaceCleared);
        }

        let alias = settings
            .active()
            .map(|a| a.alias.to_string())
            .ok_or(ConfigError::NoActiveProfile)?;
        self.set_workspace(&alias)?;
        Ok(ProfileEvent::WorkspacePinned(alias))
    }

    fn require(&self, alias: &str) -> Result<Profile, ConfigError> {
        self.settings()?
            .profile(alias)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProfile(alias.to_string()))
    }

    fn notify(&self, event: ProfileEvent) -> Result<(), ConfigError> {
        if self.observers.is_empty() {
            return Ok(());
        }
        let settings = self.settings()?;
        for observer in &self.observers {
            observer.profiles_changed(&event, &settings);
        }
        Ok(())
    }

    fn open_global(&self) -> Result<DocumentMut, ConfigError> {
        open_document(&self.paths.config_file)
    }

    fn write_global(&self, doc: &DocumentMut) -> Result<(), ConfigError> {
        write_document(&self.paths.config_file, doc)
    }

    fn write_workspace_pin(&self, alias: Option<&str>) -> Result<(), ConfigError> {
        let path = self
            .paths
            .workspace_file
            .as_ref()
            .ok_or(ConfigError::NoWorkspace)?;

        let mut doc = open_document(path)?;
        match alias {
            Some(alias) => {
                doc["workspace_profile"] = value(alias);
            }
            None => {
                doc.remove("workspace_profile");
            }
        }

        // Nothing left to say: drop the file rather than leave an empty one.
        if doc.as_table().is_empty() && doc.to_string().trim().is_empty() {
            return match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(ConfigError::WriteFailed {
                    path: path.clone(),
                    source,
                }),
            };
        }
        write_document(path, &doc)
    }
}

fn normalize_alias(alias: &str) -> Result<String, ConfigError> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(ConfigError::EmptyAlias);
    }
    Ok(alias.to_string())
}

/// The `[profiles]` parent table, created implicit so only
/// `[profiles.<alias>]` headers appear in the file.
fn profiles_table(doc: &mut DocumentMut) -> &mut Table {
    let item = doc.entry("profiles").or_insert_with(|| {
        let mut table = Table::new();
        table.set_implicit(true);
        Item::Table(table)
    });
    if !item.is_table() {
        let mut table = Table::new();
        table.set_implicit(true);
        *item = Item::Table(table);
    }
    item.as_table_mut()
        .unwrap_or_else(|| unreachable!("profiles item was just made a table"))
}

fn profile_table(profile: &Profile) -> Table {
    let mut table = Table::new();
    write_profile_fields(&mut table, profile);
    table
}

fn write_profile_fields(table: &mut Table, profile: &Profile) {
    table["provider"] = value(profile.provider.as_str());
    table["model"] = value(profile.model.as_str());
    table["commit_style"] = value(profile.commit_style.as_str());
    table["custom_prompt"] = value(profile.custom_prompt.as_str());
    table["locale"] = value(profile.locale.as_str());
}

fn open_document(path: &Path) -> Result<DocumentMut, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    content
        .parse::<DocumentMut>()
        .map_err(|source| ConfigError::InvalidDocument {
            path: path.to_path_buf(),
            source,
        })
}

fn write_document(path: &Path, doc: &DocumentMut) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir: PathBuf = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(doc.to_string().as_bytes())
        .map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
