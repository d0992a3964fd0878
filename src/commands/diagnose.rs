//! `llmessage check` and `llmessage debug`.

use crate::commands::Workspace;
use crate::config::secrets::SecretStore;
use crate::error::ConfigError;
use crate::git::diff::{DiffProvider, RepoDiffProvider};
use crate::provider::create_provider;

/// Readiness of the effective profile's provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub profile_alias: String,
    pub provider: &'static str,
    pub available: bool,
}

impl CheckReport {
    pub fn summary(&self) -> String {
        let state = if self.available {
            "available"
        } else {
            "not available"
        };
        format!("[{}] {} is {}", self.profile_alias, self.provider, state)
    }
}

/// Build the effective profile's adapter and probe it.
pub async fn check(
    workspace: &Workspace,
    secrets: &dyn SecretStore,
) -> Result<CheckReport, ConfigError> {
    let settings = workspace.settings()?;
    let resolved = create_provider(&settings, secrets)?;
    let available = resolved.provider.is_available().await;
    Ok(CheckReport {
        profile_alias: resolved.profile_alias,
        provider: resolved.provider.name(),
        available,
    })
}

/// Environment snapshot for bug reports. Never fails; problems are printed
/// in place of the value.
pub async fn debug_report(workspace: &Workspace) -> String {
    let mut lines = vec![format!("version: {}", env!("CARGO_PKG_VERSION"))];
    lines.push(format!(
        "config: {}",
        workspace.paths.config_file.display()
    ));

    match workspace.settings() {
        Ok(settings) => {
            lines.push(format!(
                "activeProfile: {}",
                display_or_none(&settings.active_profile)
            ));
            lines.push(format!(
                "workspaceProfile: {}",
                display_or_none(&settings.workspace_profile)
            ));
            match settings.active() {
                Some(active) => {
                    lines.push(format!("provider: {}", active.profile.provider));
                    lines.push(format!("model: {}", active.profile.model_label()));
                    lines.push(format!("scope: {}", active.scope.label()));
                }
                None => lines.push("provider: (no active profile)".to_string()),
            }
        }
        Err(e) => lines.push(format!("settings: error: {e}")),
    }

    match RepoDiffProvider::new(&workspace.cwd).collect().await {
        Ok(snapshot) => lines.push(format!(
            "diff: {} chars ({}{})",
            snapshot.text.chars().count(),
            snapshot.source.as_str(),
            if snapshot.truncated { ", truncated" } else { "" }
        )),
        Err(e) => lines.push(format!("diff: {e}")),
    }

    lines.join("\n")
}

fn display_or_none(value: &str) -> &str {
    if value.trim().is_empty() {
        "(none)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::{Profile, ProviderKind};
    use crate::config::secrets::MemorySecretStore;
    use crate::config::settings::ConfigPaths;
    use crate::config::store::ProfileStore;

    #[tokio::test]
    async fn test_check_reports_keyed_provider_available() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::in_dir(dir.path(), None);
        ProfileStore::new(paths.clone())
            .add("work", &Profile::new(ProviderKind::OpenAi))
            .unwrap();
        let workspace = Workspace::with_paths(dir.path(), paths);

        let report = check(&workspace, &MemorySecretStore::with_key("work", "sk"))
            .await
            .unwrap();
        assert_eq!(report.summary(), "[work] OpenAI is available");
    }

    #[tokio::test]
    async fn test_debug_report_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::in_dir(dir.path(), None);
        let workspace = Workspace::with_paths(dir.path(), paths);

        let report = debug_report(&workspace).await;
        assert!(report.starts_with(&format!("version: {}", env!("CARGO_PKG_VERSION"))));
        assert!(report.contains("activeProfile: (none)"));
        assert!(report.contains("provider: (no active profile)"));
        assert!(report.contains("diff: No Git repository found"));
    }
}
