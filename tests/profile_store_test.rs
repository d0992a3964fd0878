//! Config discovery and profile management against real files.

mod common;

use std::sync::Arc;

use common::TestRepo;
use llmessage::commands::Workspace;
use llmessage::config::secrets::{FileSecretStore, SecretStore};
use llmessage::config::settings::{CONFIG_DIR_ENV_VAR, ConfigPaths, ProfileScope};
use llmessage::notify::{Level, Notifier, RecordingNotifier};
use llmessage::provider::create_provider;
use llmessage::{Profile, ProviderKind};
use serial_test::serial;

#[test]
#[serial]
fn test_config_dir_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    temp_env::with_var(CONFIG_DIR_ENV_VAR, Some(dir.path()), || {
        let paths = ConfigPaths::discover(None).unwrap();
        assert_eq!(paths.config_file, dir.path().join("config.toml"));
        assert_eq!(paths.secrets_file, dir.path().join("secrets.json"));
        assert_eq!(paths.workspace_file, None);
    });
}

#[test]
#[serial]
fn test_empty_env_var_falls_back_to_platform_dir() {
    temp_env::with_var(CONFIG_DIR_ENV_VAR, Some(""), || {
        if let Ok(paths) = ConfigPaths::discover(None) {
            assert!(paths.config_file.ends_with("llmessage/config.toml"));
        }
    });
}

#[test]
#[serial]
fn test_workspace_discovered_from_subdirectory() {
    let repo = TestRepo::new();
    let nested = repo.path().join("src/deep");
    std::fs::create_dir_all(&nested).unwrap();
    let config_dir = tempfile::tempdir().unwrap();

    temp_env::with_var(CONFIG_DIR_ENV_VAR, Some(config_dir.path()), || {
        let workspace = Workspace::discover(&nested).unwrap();
        let root = workspace.root.clone().unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
        assert_eq!(
            workspace.paths.workspace_file,
            Some(root.join(".llmessage.toml"))
        );
    });
}

#[test]
fn test_profile_lifecycle_with_notifications() {
    let repo = TestRepo::new();
    let config = repo.config();
    let workspace = Workspace::with_paths(repo.path(), config.paths.clone());
    let recorder = Arc::new(RecordingNotifier::new());
    let notifier: Arc<dyn Notifier> = recorder.clone();
    let store = workspace.store(notifier);
    let secrets = workspace.secrets();

    store.add("work", &Profile::new(ProviderKind::OpenAi)).unwrap();
    secrets.set("work", "sk-work").unwrap();
    store.add("home", &Profile::new(ProviderKind::Local)).unwrap();

    let settings = workspace.settings().unwrap();
    let active = settings.active().unwrap();
    assert_eq!(active.alias, "home");
    assert_eq!(active.scope, ProfileScope::Global);

    store.set_workspace("work").unwrap();
    let settings = workspace.settings().unwrap();
    let active = settings.active().unwrap();
    assert_eq!(active.alias, "work");
    assert_eq!(active.scope, ProfileScope::Workspace);
    assert!(repo.path().join(".llmessage.toml").exists());

    let resolved = create_provider(&settings, &secrets).unwrap();
    assert_eq!(resolved.profile_alias, "work");
    assert_eq!(resolved.provider.name(), "OpenAI");

    store.rename("work", "office", &secrets).unwrap();
    assert_eq!(secrets.get("office").unwrap().as_deref(), Some("sk-work"));
    assert_eq!(secrets.get("work").unwrap(), None);
    let settings = workspace.settings().unwrap();
    assert_eq!(settings.workspace_profile, "office");

    store.remove("office", &secrets).unwrap();
    assert_eq!(secrets.get("office").unwrap(), None);
    assert!(!repo.path().join(".llmessage.toml").exists());
    let settings = workspace.settings().unwrap();
    assert_eq!(settings.active().unwrap().alias, "home");

    assert_eq!(
        recorder.at(Level::Info),
        vec![
            "Added profile \"work\". Active: work (Global)",
            "Added profile \"home\". Active: home (Global)",
            "Pinned \"work\" to this repository",
            "Renamed \"work\" to \"office\"",
            "Removed profile \"office\". Active: home (Global)",
        ]
    );
}

#[test]
fn test_hand_edited_config_survives_store_writes() {
    let repo = TestRepo::new();
    let config = repo.config();
    config.write_config(
        r#"# my llmessage setup
active_profile = "home"

[profiles.home]
provider = "local" # on the laptop
model = "llama3.2"

[local]
url = "http://gpu-box:11434"
"#,
    );

    let workspace = Workspace::with_paths(repo.path(), config.paths.clone());
    let store = workspace.store(Arc::new(RecordingNotifier::new()));
    store.add("work", &Profile::new(ProviderKind::Anthropic)).unwrap();

    let text = std::fs::read_to_string(&config.paths.config_file).unwrap();
    assert!(text.contains("# my llmessage setup"));
    assert!(text.contains("url = \"http://gpu-box:11434\""));

    let settings = workspace.settings().unwrap();
    let aliases: Vec<&str> = settings.aliases().collect();
    assert_eq!(aliases, ["home", "work"]);
    assert_eq!(settings.local.url, "http://gpu-box:11434");
}

#[test]
fn test_secrets_file_shared_between_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.json");
    FileSecretStore::new(&path).set("work", "sk-1").unwrap();
    assert_eq!(
        FileSecretStore::new(&path).get("work").unwrap().as_deref(),
        Some("sk-1")
    );
}
