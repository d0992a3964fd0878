//! Build the adapter for a profile, with its credentials and endpoint.

use tracing::debug;

use super::{
    AnthropicProvider, CustomProvider, GeminiProvider, LocalProvider, OpenAiProvider,
    ProviderAdapter,
};
use crate::config::profile::{Profile, ProviderKind};
use crate::config::secrets::SecretStore;
use crate::config::settings::Settings;
use crate::error::ConfigError;

/// An adapter ready for one generate call.
pub struct ResolvedProvider {
    pub provider: Box<dyn ProviderAdapter>,
    /// Model from the profile; `None` lets the adapter pick its default.
    pub model_override: Option<String>,
    pub profile_alias: String,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider.name())
            .field("model_override", &self.model_override)
            .field("profile_alias", &self.profile_alias)
            .finish()
    }
}

/// Adapter for the effective profile (workspace pin, else global active).
pub fn create_provider(
    settings: &Settings,
    secrets: &dyn SecretStore,
) -> Result<ResolvedProvider, ConfigError> {
    let active = settings.active().ok_or(ConfigError::NoActiveProfile)?;
    build(active.alias, active.profile, settings, secrets)
}

/// Adapter for a named profile, ignoring which one is active.
pub fn create_provider_for(
    alias: &str,
    settings: &Settings,
    secrets: &dyn SecretStore,
) -> Result<ResolvedProvider, ConfigError> {
    let profile = settings
        .profile(alias)
        .ok_or_else(|| ConfigError::UnknownProfile(alias.to_string()))?;
    build(alias, profile, settings, secrets)
}

fn build(
    alias: &str,
    profile: &Profile,
    settings: &Settings,
    secrets: &dyn SecretStore,
) -> Result<ResolvedProvider, ConfigError> {
    // Checked before touching the secret store.
    if profile.provider == ProviderKind::Custom && settings.custom.url.trim().is_empty() {
        return Err(ConfigError::MissingCustomUrl);
    }

    let api_key = if profile.provider.requires_api_key() {
        secrets
            .get(alias)?
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(alias.to_string()))?
    } else {
        String::new()
    };

    let provider: Box<dyn ProviderAdapter> = match profile.provider {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(api_key)),
        ProviderKind::Local => Box::new(LocalProvider::new(&settings.local.url)),
        ProviderKind::Custom => Box::new(CustomProvider::new(
            api_key,
            &settings.custom.url,
            settings.custom.model.as_str(),
        )),
    };

    debug!(
        "Resolved profile \"{}\" to {} (model {})",
        alias,
        provider.name(),
        profile.model_label()
    );

    Ok(ResolvedProvider {
        provider,
        model_override: profile.model_override(),
        profile_alias: alias.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::NamedProfile;
    use crate::config::secrets::MemorySecretStore;
    use crate::error::SecretError;

    fn settings_with(alias: &str, profile: Profile) -> Settings {
        Settings {
            active_profile: alias.to_string(),
            profiles: vec![NamedProfile {
                alias: alias.to_string(),
                profile,
            }],
            ..Settings::default()
        }
    }

    /// Fails the test if the factory reads a key when it should not.
    struct ForbiddenSecrets;

    impl SecretStore for ForbiddenSecrets {
        fn get(&self, alias: &str) -> Result<Option<String>, SecretError> {
            panic!("secret store consulted for {alias}");
        }
        fn set(&self, _: &str, _: &str) -> Result<(), SecretError> {
            unreachable!()
        }
        fn remove(&self, _: &str) -> Result<(), SecretError> {
            unreachable!()
        }
    }

    #[test]
    fn test_no_profiles_is_no_active_profile() {
        let err = create_provider(&Settings::default(), &MemorySecretStore::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoActiveProfile));
        assert!(err.to_string().contains("profile add"));
    }

    #[test]
    fn test_missing_key_names_the_alias() {
        let settings = settings_with("work", Profile::new(ProviderKind::Anthropic));
        let err = create_provider(&settings, &MemorySecretStore::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(ref a) if a == "work"));
        assert!(err.to_string().contains("\"work\""));
    }

    /// A hand-edited secrets file holding whitespace only.
    struct BlankSecrets;

    impl SecretStore for BlankSecrets {
        fn get(&self, _: &str) -> Result<Option<String>, SecretError> {
            Ok(Some("   ".to_string()))
        }
        fn set(&self, _: &str, _: &str) -> Result<(), SecretError> {
            unreachable!()
        }
        fn remove(&self, _: &str) -> Result<(), SecretError> {
            unreachable!()
        }
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let settings = settings_with("work", Profile::new(ProviderKind::OpenAi));
        assert!(matches!(
            create_provider(&settings, &BlankSecrets),
            Err(ConfigError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_local_needs_no_key() {
        let mut profile = Profile::new(ProviderKind::Local);
        profile.model = "mistral".to_string();
        let settings = settings_with("home", profile);

        let resolved = create_provider(&settings, &ForbiddenSecrets).unwrap();
        assert_eq!(resolved.provider.name(), "Local");
        assert_eq!(resolved.model_override.as_deref(), Some("mistral"));
        assert_eq!(resolved.profile_alias, "home");
    }

    #[test]
    fn test_custom_without_url_fails_before_secret_lookup() {
        let settings = settings_with("edge", Profile::new(ProviderKind::Custom));
        let err = create_provider(&settings, &ForbiddenSecrets).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCustomUrl));
        assert!(err.to_string().contains("custom.url"));
    }

    #[test]
    fn test_each_keyed_provider_maps_to_its_adapter() {
        let cases = [
            (ProviderKind::OpenAi, "OpenAI"),
            (ProviderKind::Anthropic, "Anthropic"),
            (ProviderKind::Gemini, "Google Gemini"),
            (ProviderKind::Custom, "Custom"),
        ];
        for (kind, name) in cases {
            let mut settings = settings_with("p", Profile::new(kind));
            settings.custom.url = "http://llm.internal".to_string();
            let secrets = MemorySecretStore::with_key("p", "sk-test");

            let resolved = create_provider(&settings, &secrets).unwrap();
            assert_eq!(resolved.provider.name(), name);
            assert_eq!(resolved.model_override, None);
        }
    }

    #[test]
    fn test_create_provider_for_ignores_active() {
        let mut settings = settings_with("a", Profile::new(ProviderKind::OpenAi));
        settings.profiles.push(NamedProfile {
            alias: "b".to_string(),
            profile: Profile::new(ProviderKind::Local),
        });

        let resolved = create_provider_for("b", &settings, &MemorySecretStore::new()).unwrap();
        assert_eq!(resolved.profile_alias, "b");
        assert!(matches!(
            create_provider_for("zzz", &settings, &MemorySecretStore::new()),
            Err(ConfigError::UnknownProfile(_))
        ));
    }
}
