//! Text rendering of profiles for the terminal.

use crate::config::profile::CommitStyle;
use crate::config::settings::{ActiveProfile, Settings};

/// Characters of a custom prompt shown in the detail view.
const PROMPT_PREVIEW_LEN: usize = 60;

/// One line per profile, `*` marking the effective one.
///
/// ```text
/// * work   OpenAI · gpt-4o
///   home   Local (Ollama, LM Studio, etc.) · default
/// ```
pub fn render_profile_list(settings: &Settings) -> String {
    if settings.profiles.is_empty() {
        return "No profiles. Run \"llmessage profile add\" to create one.".to_string();
    }

    let active = settings.active().map(|a| a.alias);
    let width = settings
        .profiles
        .iter()
        .map(|p| p.alias.chars().count())
        .max()
        .unwrap_or(0);

    settings
        .profiles
        .iter()
        .map(|p| {
            let marker = if Some(p.alias.as_str()) == active { '*' } else { ' ' };
            format!(
                "{} {:<width$}  {} · {}",
                marker,
                p.alias,
                p.profile.provider.label(),
                p.profile.model_label(),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Detail block for the effective profile.
pub fn render_active_profile(active: &ActiveProfile<'_>, has_api_key: bool) -> String {
    let profile = active.profile;
    let key = if !profile.provider.requires_api_key() {
        "not required"
    } else if has_api_key {
        "set"
    } else {
        "missing"
    };

    let mut lines = vec![
        format!("Profile:  {}", active.alias),
        format!("Scope:    {}", active.scope.label()),
        format!("Provider: {}", profile.provider.label()),
        format!("Model:    {}", profile.model_label()),
        format!("API key:  {}", key),
        format!("Style:    {}", profile.commit_style.label()),
    ];

    if profile.commit_style == CommitStyle::Custom {
        lines.push(format!("Prompt:   {}", prompt_preview(&profile.custom_prompt)));
    }
    lines.push(format!("Locale:   {}", profile.locale));

    lines.join("\n")
}

/// First line of the prompt, shortened.
fn prompt_preview(prompt: &str) -> String {
    let first = prompt.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        None => "(not set)".to_string(),
        Some(line) if line.chars().count() > PROMPT_PREVIEW_LEN => {
            let cut: String = line.chars().take(PROMPT_PREVIEW_LEN).collect();
            format!("{cut}…")
        }
        Some(line) => line.to_string(),
    }
}
