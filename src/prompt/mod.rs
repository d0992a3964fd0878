//! Prompt construction from a diff and the profile's style.

pub mod templates;

use tracing::debug;

use crate::config::profile::{CommitStyle, Profile};
use crate::error::PromptError;

use self::templates::{CONVENTIONAL, CONVENTIONAL_EN, SYSTEM_RULES};

const DIFF_PLACEHOLDER: &str = "{{diff}}";
const LOCALE_PLACEHOLDER: &str = "{{locale}}";
const DEFAULT_LOCALE: &str = "en";

/// The profile fields that shape the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub commit_style: CommitStyle,
    pub custom_prompt: String,
    pub locale: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            commit_style: CommitStyle::default(),
            custom_prompt: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl PromptOptions {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            commit_style: profile.commit_style,
            custom_prompt: profile.custom_prompt.clone(),
            locale: profile.locale.clone(),
        }
    }
}

/// System rules followed by the style template, placeholders filled in.
///
/// `{{locale}}` is substituted before `{{diff}}` so placeholder-like text
/// inside the diff is never rewritten.
pub fn build_prompt(diff: &str, options: &PromptOptions) -> Result<String, PromptError> {
    let template = match options.commit_style {
        CommitStyle::Conventional => CONVENTIONAL,
        CommitStyle::ConventionalEn => CONVENTIONAL_EN,
        CommitStyle::Custom => {
            if options.custom_prompt.trim().is_empty() {
                return Err(PromptError::MissingCustomPrompt);
            }
            options.custom_prompt.as_str()
        }
    };

    let locale = match options.locale.trim() {
        "" => DEFAULT_LOCALE,
        locale => locale,
    };

    let body = template
        .replace(LOCALE_PLACEHOLDER, locale)
        .replace(DIFF_PLACEHOLDER, diff);
    let prompt = format!("{SYSTEM_RULES}{body}");

    debug!(
        "Built {} prompt: {} chars",
        options.commit_style.as_str(),
        prompt.len()
    );
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_uses_locale() {
        let options = PromptOptions {
            locale: "ko".to_string(),
            ..Default::default()
        };
        let prompt = build_prompt("+fn main() {}", &options).unwrap();
        assert!(prompt.starts_with(SYSTEM_RULES));
        assert!(prompt.contains("Write it in ko only."));
        assert!(prompt.contains("+fn main() {}"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_conventional_en_ignores_locale() {
        let options = PromptOptions {
            commit_style: CommitStyle::ConventionalEn,
            locale: "ja".to_string(),
            ..Default::default()
        };
        let prompt = build_prompt("diff", &options).unwrap();
        assert!(prompt.contains("English only"));
        assert!(!prompt.contains("in ja"));
    }

    #[test]
    fn test_custom_replaces_every_placeholder() {
        let options = PromptOptions {
            commit_style: CommitStyle::Custom,
            custom_prompt: "[{{locale}}] {{diff}} / {{diff}} ({{locale}})".to_string(),
            locale: "de".to_string(),
        };
        let prompt = build_prompt("D", &options).unwrap();
        assert_eq!(prompt, format!("{SYSTEM_RULES}[de] D / D (de)"));
    }

    #[test]
    fn test_custom_without_prompt_is_error() {
        let options = PromptOptions {
            commit_style: CommitStyle::Custom,
            custom_prompt: "  \n".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_prompt("diff", &options),
            Err(PromptError::MissingCustomPrompt)
        ));
    }

    #[test]
    fn test_placeholders_inside_diff_survive() {
        let prompt = build_prompt("+let s = \"{{locale}}\";", &PromptOptions::default()).unwrap();
        assert!(prompt.contains("+let s = \"{{locale}}\";"));
    }

    #[test]
    fn test_blank_locale_defaults_to_en() {
        let options = PromptOptions {
            locale: " ".to_string(),
            ..Default::default()
        };
        assert!(build_prompt("d", &options).unwrap().contains("Write it in en only."));
    }
}
