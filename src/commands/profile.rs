//! `llmessage profile`, `workspace` and `key`.
//!
//! Every function takes its inputs explicitly and only falls back to an
//! interactive prompt when one is missing.

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use dialoguer::{Confirm, Editor, Input, Password, Select};
use tracing::warn;

use crate::commands::Workspace;
use crate::config::profile::{CommitStyle, Profile, ProviderKind};
use crate::config::secrets::SecretStore;
use crate::config::store::{ProfileEvent, ProfileStore, ProfileUpdate};
use crate::error::{CommandError, ConfigError};
use crate::prompt::templates::CUSTOM_STARTER;
use crate::view::{render_active_profile, render_profile_list};

/// Inputs for `profile add`; `None` fields are asked for.
#[derive(Debug, Clone, Default)]
pub struct AddProfile {
    pub alias: Option<String>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub commit_style: Option<CommitStyle>,
    pub locale: Option<String>,
    /// Read the API key from stdin instead of prompting.
    pub api_key_stdin: bool,
}

pub fn list(workspace: &Workspace) -> Result<String, CommandError> {
    Ok(render_profile_list(&workspace.settings()?))
}

pub fn show(workspace: &Workspace, secrets: &dyn SecretStore) -> Result<String, CommandError> {
    let settings = workspace.settings()?;
    let active = settings.active().ok_or(ConfigError::NoActiveProfile)?;
    let has_key = secrets
        .get(active.alias)?
        .is_some_and(|key| !key.trim().is_empty());
    Ok(render_active_profile(&active, has_key))
}

/// Create a profile, store its key and make it active.
pub fn add(
    store: &ProfileStore,
    secrets: &dyn SecretStore,
    args: AddProfile,
) -> Result<String, CommandError> {
    let provider = match args.provider {
        Some(provider) => provider,
        None => select_provider()?,
    };
    let model = match args.model {
        Some(model) => model.trim().to_string(),
        None => select_model(provider)?,
    };
    let alias = match args.alias {
        Some(alias) => alias,
        None => Input::<String>::new()
            .with_prompt("Profile name")
            .default(provider.as_str().to_string())
            .interact_text()?,
    };

    let api_key = if provider.requires_api_key() {
        Some(read_api_key(args.api_key_stdin)?)
    } else {
        None
    };

    let mut profile = Profile::new(provider);
    profile.model = model;
    if let Some(style) = args.commit_style {
        profile.commit_style = style;
    }
    if let Some(locale) = args.locale {
        profile.locale = locale.trim().to_string();
    }

    let alias = store.add(&alias, &profile)?;
    if let Some(key) = api_key {
        if let Err(e) = secrets.set(&alias, &key) {
            // Leave no keyless profile behind.
            if let Err(rollback) = store.remove(&alias, secrets) {
                warn!("Failed to roll back profile \"{}\": {}", alias, rollback);
            }
            return Err(e.into());
        }
    }
    Ok(alias)
}

pub fn remove(
    store: &ProfileStore,
    secrets: &dyn SecretStore,
    alias: &str,
    assume_yes: bool,
) -> Result<(), CommandError> {
    if !store.settings()?.contains(alias) {
        return Err(ConfigError::UnknownProfile(alias.to_string()).into());
    }
    if !assume_yes
        && !Confirm::new()
            .with_prompt(format!("Delete profile \"{alias}\" and its API key?"))
            .default(false)
            .interact()?
    {
        return Err(CommandError::Cancelled);
    }
    store.remove(alias, secrets)?;
    Ok(())
}

pub fn switch(store: &ProfileStore, alias: Option<String>) -> Result<(), CommandError> {
    let alias = match alias {
        Some(alias) => alias,
        None => select_alias(store, "Switch to")?,
    };
    store.switch(&alias)?;
    Ok(())
}

pub fn rename(
    store: &ProfileStore,
    secrets: &dyn SecretStore,
    from: &str,
    to: Option<String>,
) -> Result<String, CommandError> {
    let to = match to {
        Some(to) => to,
        None => Input::<String>::new()
            .with_prompt("New name")
            .default(from.to_string())
            .interact_text()?,
    };
    Ok(store.rename(from, &to, secrets)?)
}

/// Apply `update` to `alias` (default: the effective profile). An empty
/// update asks which field to change.
pub fn edit(
    store: &ProfileStore,
    alias: Option<String>,
    update: ProfileUpdate,
) -> Result<Profile, CommandError> {
    let settings = store.settings()?;
    let alias = match alias {
        Some(alias) => alias,
        None => settings
            .active()
            .map(|a| a.alias.to_string())
            .ok_or(ConfigError::NoActiveProfile)?,
    };
    let current = settings
        .profile(&alias)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownProfile(alias.clone()))?;

    let mut update = if update.is_empty() {
        ask_update(&current)?
    } else {
        update
    };

    // Switching to the custom style with nothing to run would fail at generate time.
    let ends_custom = update.commit_style == Some(CommitStyle::Custom);
    let prompt_blank = update
        .custom_prompt
        .as_deref()
        .unwrap_or(&current.custom_prompt)
        .trim()
        .is_empty();
    if ends_custom && prompt_blank {
        update.custom_prompt = Some(CUSTOM_STARTER.to_string());
    }

    Ok(store.update(&alias, &update)?)
}

/// Set a profile's custom prompt and switch it to the custom style.
///
/// The prompt comes from `text`, else `file`, else an editor seeded with the
/// current prompt.
pub fn set_prompt(
    store: &ProfileStore,
    alias: Option<String>,
    text: Option<String>,
    file: Option<&Path>,
) -> Result<(), CommandError> {
    let settings = store.settings()?;
    let alias = match alias {
        Some(alias) => alias,
        None => settings
            .active()
            .map(|a| a.alias.to_string())
            .ok_or(ConfigError::NoActiveProfile)?,
    };
    let current = settings
        .profile(&alias)
        .ok_or_else(|| ConfigError::UnknownProfile(alias.clone()))?;

    let prompt = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|source| CommandError::ReadInput {
                what: path.display().to_string(),
                source,
            })?
        }
        (None, None) => {
            let seed = if current.custom_prompt.trim().is_empty() {
                CUSTOM_STARTER
            } else {
                current.custom_prompt.as_str()
            };
            Editor::new()
                .extension(".md")
                .edit(seed)
                .map_err(|e| CommandError::ReadInput {
                    what: "prompt from editor".to_string(),
                    source: e.into(),
                })?
                .ok_or(CommandError::Cancelled)?
        }
    };

    if prompt.trim().is_empty() {
        return Err(CommandError::InvalidInput(
            "Custom prompt cannot be empty".to_string(),
        ));
    }

    store.update(
        &alias,
        &ProfileUpdate {
            commit_style: Some(CommitStyle::Custom),
            custom_prompt: Some(prompt),
            ..Default::default()
        },
    )?;
    Ok(())
}

pub fn workspace_set(store: &ProfileStore, alias: Option<String>) -> Result<(), CommandError> {
    let alias = match alias {
        Some(alias) => alias,
        None => select_alias(store, "Use for this repository")?,
    };
    store.set_workspace(&alias)?;
    Ok(())
}

pub fn workspace_clear(store: &ProfileStore) -> Result<(), CommandError> {
    store.clear_workspace()?;
    Ok(())
}

pub fn workspace_toggle(store: &ProfileStore) -> Result<ProfileEvent, CommandError> {
    Ok(store.toggle_scope()?)
}

/// Store or replace a profile's API key.
pub fn key_set(
    workspace: &Workspace,
    secrets: &dyn SecretStore,
    alias: &str,
    from_stdin: bool,
) -> Result<(), CommandError> {
    if !workspace.settings()?.contains(alias) {
        return Err(ConfigError::UnknownProfile(alias.to_string()).into());
    }
    let key = read_api_key(from_stdin)?;
    secrets.set(alias, &key)?;
    Ok(())
}

pub fn key_remove(secrets: &dyn SecretStore, alias: &str) -> Result<(), CommandError> {
    secrets.remove(alias)?;
    Ok(())
}

fn select_provider() -> Result<ProviderKind, CommandError> {
    let labels: Vec<&str> = ProviderKind::ALL.iter().map(|p| p.label()).collect();
    let index = Select::new()
        .with_prompt("Provider")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(ProviderKind::ALL[index])
}

/// Pick a suggested model, the provider default (empty), or type one.
fn select_model(provider: ProviderKind) -> Result<String, CommandError> {
    let suggested = provider.suggested_models();
    if suggested.is_empty() {
        return Ok(Input::<String>::new()
            .with_prompt("Model (empty for the endpoint's default)")
            .allow_empty(true)
            .interact_text()?
            .trim()
            .to_string());
    }

    let mut items: Vec<&str> = suggested.to_vec();
    items.push("Provider default");
    items.push("Other...");
    let index = Select::new()
        .with_prompt("Model")
        .items(&items)
        .default(0)
        .interact()?;

    match index {
        i if i < suggested.len() => Ok(suggested[i].to_string()),
        i if i == suggested.len() => Ok(String::new()),
        _ => Ok(Input::<String>::new()
            .with_prompt("Model name")
            .interact_text()?
            .trim()
            .to_string()),
    }
}

fn select_alias(store: &ProfileStore, prompt: &str) -> Result<String, CommandError> {
    let settings = store.settings()?;
    let aliases: Vec<&str> = settings.aliases().collect();
    if aliases.is_empty() {
        return Err(ConfigError::NoActiveProfile.into());
    }
    let current = settings
        .active()
        .and_then(|a| aliases.iter().position(|x| *x == a.alias))
        .unwrap_or(0);
    let index = Select::new()
        .with_prompt(prompt)
        .items(&aliases)
        .default(current)
        .interact()?;
    Ok(aliases[index].to_string())
}

/// Which field to change, then its new value.
fn ask_update(current: &Profile) -> Result<ProfileUpdate, CommandError> {
    let fields = ["Provider", "Model", "Commit style", "Locale"];
    let field = Select::new()
        .with_prompt("Change")
        .items(&fields)
        .default(0)
        .interact()?;

    let mut update = ProfileUpdate::default();
    match field {
        0 => {
            let provider = select_provider()?;
            update.provider = Some(provider);
            update.model = Some(select_model(provider)?);
        }
        1 => update.model = Some(select_model(current.provider)?),
        2 => {
            let labels: Vec<&str> = CommitStyle::ALL.iter().map(|s| s.label()).collect();
            let default = CommitStyle::ALL
                .iter()
                .position(|s| *s == current.commit_style)
                .unwrap_or(0);
            let index = Select::new()
                .with_prompt("Commit style")
                .items(&labels)
                .default(default)
                .interact()?;
            update.commit_style = Some(CommitStyle::ALL[index]);
        }
        _ => {
            update.locale = Some(
                Input::<String>::new()
                    .with_prompt("Locale")
                    .default(current.locale.clone())
                    .interact_text()?,
            );
        }
    }
    Ok(update)
}

/// API key from the first line of stdin, or a hidden prompt on a terminal.
fn read_api_key(from_stdin: bool) -> Result<String, CommandError> {
    let stdin = std::io::stdin();
    let key = if from_stdin || !stdin.is_terminal() {
        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .map_err(|source| CommandError::ReadInput {
                what: "API key from stdin".to_string(),
                source,
            })?;
        line
    } else {
        Password::new().with_prompt("API key").interact()?
    };

    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(CommandError::InvalidInput("API key cannot be empty".to_string()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secrets::MemorySecretStore;
    use crate::config::settings::ConfigPaths;

    fn store_in(dir: &Path) -> ProfileStore {
        ProfileStore::new(ConfigPaths::in_dir(dir, Some(dir)))
    }

    #[test]
    fn test_add_local_profile_needs_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let secrets = MemorySecretStore::new();

        let alias = add(
            &store,
            &secrets,
            AddProfile {
                alias: Some("home".to_string()),
                provider: Some(ProviderKind::Local),
                model: Some("mistral".to_string()),
                locale: Some("fr".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(alias, "home");
        let settings = store.settings().unwrap();
        let profile = settings.profile("home").unwrap();
        assert_eq!(profile.model, "mistral");
        assert_eq!(profile.locale, "fr");
        assert_eq!(secrets.get("home").unwrap(), None);
    }

    #[test]
    fn test_edit_to_custom_seeds_a_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.add("work", &Profile::new(ProviderKind::OpenAi)).unwrap();

        let profile = edit(
            &store,
            None,
            ProfileUpdate {
                commit_style: Some(CommitStyle::Custom),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(profile.commit_style, CommitStyle::Custom);
        assert_eq!(profile.custom_prompt, CUSTOM_STARTER);
    }

    #[test]
    fn test_set_prompt_from_text_switches_style() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.add("work", &Profile::new(ProviderKind::OpenAi)).unwrap();

        set_prompt(&store, None, Some("Summarize: {{diff}}".to_string()), None).unwrap();
        let settings = store.settings().unwrap();
        let profile = settings.profile("work").unwrap();
        assert_eq!(profile.commit_style, CommitStyle::Custom);
        assert_eq!(profile.custom_prompt, "Summarize: {{diff}}");
    }

    #[test]
    fn test_set_prompt_rejects_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.add("work", &Profile::new(ProviderKind::OpenAi)).unwrap();
        assert!(matches!(
            set_prompt(&store, Some("work".to_string()), Some("  ".to_string()), None),
            Err(CommandError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_remove_unknown_profile_skips_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let err = remove(&store, &MemorySecretStore::new(), "ghost", false).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Config(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_key_remove_is_idempotent() {
        let secrets = MemorySecretStore::with_key("work", "sk");
        key_remove(&secrets, "work").unwrap();
        key_remove(&secrets, "work").unwrap();
        assert_eq!(secrets.get("work").unwrap(), None);
    }
}
