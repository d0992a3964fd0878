//! Loading the global config file and the per-repository override.
//!
//! The global file lives in `$LLMESSAGE_CONFIG_DIR` (or the platform config
//! directory) and holds every profile plus the globally active alias. A
//! repository may pin its own profile in `.llmessage.toml` at the work-tree
//! root; that pin wins over the global choice.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::profile::{NamedProfile, Profile};
use crate::error::ConfigError;

/// Environment variable to override the config directory.
pub const CONFIG_DIR_ENV_VAR: &str = "LLMESSAGE_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SECRETS_FILE_NAME: &str = "secrets.json";
pub const WORKSPACE_FILE_NAME: &str = ".llmessage.toml";

/// Where a local Ollama-style server listens unless configured otherwise.
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434";

/// Resolved locations of every file llmessage reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
    pub secrets_file: PathBuf,
    /// `None` outside a git work tree.
    pub workspace_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Locate the config directory from the environment.
    ///
    /// Uses `LLMESSAGE_CONFIG_DIR` when set and non-empty, otherwise
    /// `<platform config dir>/llmessage`.
    pub fn discover(workspace_root: Option<&Path>) -> Result<Self, ConfigError> {
        let dir = match env::var(CONFIG_DIR_ENV_VAR) {
            Ok(v) if !v.is_empty() => PathBuf::from(v),
            _ => dirs::config_dir()
                .map(|d| d.join("llmessage"))
                .ok_or(ConfigError::NoConfigDir)?,
        };
        Ok(Self::in_dir(&dir, workspace_root))
    }

    pub fn in_dir(dir: &Path, workspace_root: Option<&Path>) -> Self {
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            secrets_file: dir.join(SECRETS_FILE_NAME),
            workspace_file: workspace_root.map(|root| root.join(WORKSPACE_FILE_NAME)),
        }
    }
}

fn default_local_url() -> String {
    DEFAULT_LOCAL_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalSettings {
    #[serde(default = "default_local_url")]
    pub url: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            url: default_local_url(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalFile {
    #[serde(default)]
    active_profile: String,
    #[serde(default)]
    profiles: toml::Table,
    #[serde(default)]
    local: LocalSettings,
    #[serde(default)]
    custom: CustomSettings,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceFile {
    #[serde(default)]
    workspace_profile: String,
}

/// Which setting selected the effective profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileScope {
    Global,
    Workspace,
}

impl ProfileScope {
    pub fn label(&self) -> &'static str {
        match self {
            ProfileScope::Global => "Global",
            ProfileScope::Workspace => "Project",
        }
    }
}

/// The profile a generate call will use.
#[derive(Debug, Clone, Copy)]
pub struct ActiveProfile<'a> {
    pub alias: &'a str,
    pub profile: &'a Profile,
    pub scope: ProfileScope,
}

/// Snapshot of both config files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub active_profile: String,
    pub workspace_profile: String,
    /// In file order.
    pub profiles: Vec<NamedProfile>,
    pub local: LocalSettings,
    pub custom: CustomSettings,
}

impl Settings {
    /// Load settings. Missing files are treated as empty.
    pub fn load(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        let global: GlobalFile = read_toml(&paths.config_file)?;
        let workspace: WorkspaceFile = match &paths.workspace_file {
            Some(path) => read_toml(path)?,
            None => WorkspaceFile::default(),
        };

        let mut profiles = Vec::with_capacity(global.profiles.len());
        for (alias, value) in global.profiles {
            let profile: Profile =
                value
                    .try_into()
                    .map_err(|e: toml::de::Error| ConfigError::InvalidProfile {
                        alias: alias.clone(),
                        detail: e.message().to_string(),
                    })?;
            profiles.push(NamedProfile { alias, profile });
        }

        debug!(
            "Loaded {} profile(s), active={:?}, workspace={:?}",
            profiles.len(),
            global.active_profile,
            workspace.workspace_profile
        );

        Ok(Self {
            active_profile: global.active_profile,
            workspace_profile: workspace.workspace_profile,
            profiles,
            local: global.local,
            custom: global.custom,
        })
    }

    pub fn profile(&self, alias: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.alias == alias)
            .map(|p| &p.profile)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.profile(alias).is_some()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.alias.as_str())
    }

    /// Workspace pin if set, otherwise the global active alias.
    pub fn effective_alias(&self) -> Option<&str> {
        [&self.workspace_profile, &self.active_profile]
            .into_iter()
            .map(|alias| alias.trim())
            .find(|alias| !alias.is_empty())
    }

    /// The effective profile, or `None` when nothing is selected or the
    /// selected alias no longer exists.
    pub fn active(&self) -> Option<ActiveProfile<'_>> {
        let alias = self.effective_alias()?;
        let entry = self.profiles.iter().find(|p| p.alias == alias)?;
        let scope = if self.workspace_profile.trim() == alias {
            ProfileScope::Workspace
        } else {
            ProfileScope::Global
        };
        Some(ActiveProfile {
            alias: &entry.alias,
            profile: &entry.profile,
            scope,
        })
    }
}

fn read_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::{CommitStyle, ProviderKind};
    use serial_test::serial;
    use std::fs;

    fn write_config(dir: &Path, content: &str) -> ConfigPaths {
        let paths = ConfigPaths::in_dir(dir, Some(dir));
        fs::write(&paths.config_file, content).unwrap();
        paths
    }

    #[test]
    fn test_missing_files_give_empty_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::in_dir(dir.path(), Some(dir.path()));
        let settings = Settings::load(&paths).unwrap();
        assert!(settings.profiles.is_empty());
        assert_eq!(settings.local.url, DEFAULT_LOCAL_URL);
        assert!(settings.active().is_none());
    }

    #[test]
    fn test_profiles_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(
            dir.path(),
            "[profiles.zeta]\nprovider = \"local\"\n\n[profiles.alpha]\nprovider = \"openai\"\n",
        );
        let settings = Settings::load(&paths).unwrap();
        let aliases: Vec<&str> = settings.aliases().collect();
        assert_eq!(aliases, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_workspace_pin_wins_over_global() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(
            dir.path(),
            "active_profile = \"home\"\n[profiles.home]\nprovider = \"openai\"\n[profiles.work]\nprovider = \"anthropic\"\n",
        );
        fs::write(
            paths.workspace_file.as_ref().unwrap(),
            "workspace_profile = \"work\"\n",
        )
        .unwrap();

        let settings = Settings::load(&paths).unwrap();
        let active = settings.active().unwrap();
        assert_eq!(active.alias, "work");
        assert_eq!(active.profile.provider, ProviderKind::Anthropic);
        assert_eq!(active.scope, ProfileScope::Workspace);
    }

    #[test]
    fn test_global_profile_used_without_pin() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(
            dir.path(),
            "active_profile = \"home\"\n[profiles.home]\nprovider = \"gemini\"\ncommit_style = \"custom\"\n",
        );
        let settings = Settings::load(&paths).unwrap();
        let active = settings.active().unwrap();
        assert_eq!(active.alias, "home");
        assert_eq!(active.scope, ProfileScope::Global);
        assert_eq!(active.profile.commit_style, CommitStyle::Custom);
    }

    #[test]
    fn test_dangling_active_alias_means_no_profile() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(dir.path(), "active_profile = \"gone\"\n");
        let settings = Settings::load(&paths).unwrap();
        assert_eq!(settings.effective_alias(), Some("gone"));
        assert!(settings.active().is_none());
    }

    #[test]
    fn test_invalid_profile_names_the_alias() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(dir.path(), "[profiles.broken]\nprovider = \"bard\"\n");
        let err = Settings::load(&paths).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidProfile { ref alias, .. } if alias == "broken"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(dir.path(), "active_profile = \n");
        assert!(matches!(
            Settings::load(&paths),
            Err(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn test_custom_and_local_sections() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_config(
            dir.path(),
            "[local]\nurl = \"http://gpu-box:11434\"\n[custom]\nurl = \"https://llm.internal\"\nmodel = \"qwen\"\n",
        );
        let settings = Settings::load(&paths).unwrap();
        assert_eq!(settings.local.url, "http://gpu-box:11434");
        assert_eq!(settings.custom.url, "https://llm.internal");
        assert_eq!(settings.custom.model, "qwen");
    }

    #[test]
    #[serial]
    fn test_discover_uses_env_override() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_var(CONFIG_DIR_ENV_VAR, Some(dir.path()), || {
            let paths = ConfigPaths::discover(None).unwrap();
            assert_eq!(paths.config_file, dir.path().join(CONFIG_FILE_NAME));
            assert_eq!(paths.secrets_file, dir.path().join(SECRETS_FILE_NAME));
            assert!(paths.workspace_file.is_none());
        });
    }
}
