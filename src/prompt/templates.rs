//! Prompt text for each commit style.

/// Prepended to every prompt, custom ones included.
pub const SYSTEM_RULES: &str = "\
[SYSTEM RULES: these always apply]
- You write git commit messages.
- Reply with the raw commit message and nothing else.
- No markdown, no code fences, no preamble such as \"Commit message:\".
- Keep every bullet to a single short line.
- Stay terse. No explanations or essays.
- Follow the format instructions below.

";

/// Conventional commit written in `{{locale}}`.
pub const CONVENTIONAL: &str = "\
Write a commit message for the git diff below. Write it in {{locale}} only.

Rules:
- Start with one type: Feat, Fix, Docs, Style, Refactor, Perf, Test, Build, CI, Chore, Revert
- Title format: `Type: description`, imperative mood, under 72 characters
- Title and bullets are both written in {{locale}}
- After a blank line, list the notable changes as `- ` bullets
- Group related changes by module or directory when several files change
- Name the file or function for significant changes
- Ignore whitespace or formatting churn unless it is the whole change

Example:
Feat: Add retry budget to HttpClient

- Add RetryBudget to http/client.rs
- Drop the fixed sleep between attempts

Git diff:
```
{{diff}}
```";

/// Conventional commit, always in English.
pub const CONVENTIONAL_EN: &str = "\
Write a commit message for the git diff below. Write it in English only.

Rules:
- Start with one type: Feat, Fix, Docs, Style, Refactor, Perf, Test, Build, CI, Chore, Revert
- Title format: `Type: description`, imperative mood, under 72 characters
- After a blank line, list the notable changes as `- ` bullets
- Group related changes by module or directory when several files change
- Name the file or function for significant changes
- Ignore whitespace or formatting churn unless it is the whole change

Example:
Fix: Close idle connections in ConnectionPool

- Evict sockets idle past the keep-alive window
- Log pool size after each sweep

Git diff:
```
{{diff}}
```";

/// Starting point offered when a profile switches to the custom style.
pub const CUSTOM_STARTER: &str = "\
Write a commit message for the git diff below.

Rules:
- First line: type (Feat/Fix/Refactor/...) and an imperative title under 72 characters
- Blank line, then short `- ` bullets describing what changed
- Write in {{locale}}

Git diff:
```
{{diff}}
```";
