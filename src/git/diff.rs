//! Diff collection from the repository using git2.

use std::path::PathBuf;

use async_trait::async_trait;
use git2::{Diff, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::DiffError;

/// Maximum characters of diff text sent to a provider.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Appended to a diff cut at [`MAX_DIFF_LENGTH`].
pub const TRUNCATION_SUFFIX: &str = "\n\n... (diff truncated)";

/// Which side of the index the diff came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSource {
    /// HEAD → index.
    Staged,
    /// Index → working tree, untracked files included.
    Unstaged,
}

impl DiffSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffSource::Staged => "staged",
            DiffSource::Unstaged => "unstaged",
        }
    }
}

/// Diff text ready for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSnapshot {
    pub text: String,
    pub source: DiffSource,
    pub truncated: bool,
}

/// Source of the diff a generate call describes.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    async fn collect(&self) -> Result<DiffSnapshot, DiffError>;
}

/// Reads the repository containing `path`.
#[derive(Debug, Clone)]
pub struct RepoDiffProvider {
    path: PathBuf,
}

impl RepoDiffProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DiffProvider for RepoDiffProvider {
    async fn collect(&self) -> Result<DiffSnapshot, DiffError> {
        let path = self.path.clone();
        // libgit2 is blocking; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || {
            let repo = Repository::discover(&path).map_err(DiffError::OpenRepository)?;
            collect_diff(&repo, MAX_DIFF_LENGTH)
        })
        .await
        .map_err(|e| DiffError::Interrupted(e.to_string()))?
    }
}

/// Resolve the HEAD tree. `Ok(None)` for a repository with no commits yet.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, DiffError> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(DiffError::DiffFailed(e)),
    };

    head.peel_to_tree().map(Some).map_err(DiffError::DiffFailed)
}

/// Staged diff, or the unstaged diff when nothing is staged.
///
/// Fails with [`DiffError::NoChanges`] when both are empty. Text longer than
/// `max_len` characters is cut and suffixed with [`TRUNCATION_SUFFIX`].
pub fn collect_diff(repo: &Repository, max_len: usize) -> Result<DiffSnapshot, DiffError> {
    if repo.is_bare() {
        return Err(DiffError::BareRepository);
    }

    let head_tree = resolve_head_tree(repo)?;
    let staged = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(DiffError::DiffFailed)?;
    let mut text = patch_text(&staged)?;
    let mut source = DiffSource::Staged;

    if text.trim().is_empty() {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        let unstaged = repo
            .diff_index_to_workdir(None, Some(&mut opts))
            .map_err(DiffError::DiffFailed)?;
        text = patch_text(&unstaged)?;
        source = DiffSource::Unstaged;
    }

    if text.trim().is_empty() {
        return Err(DiffError::NoChanges);
    }

    let (text, truncated) = truncate_diff(text, max_len);
    debug!(
        "Collected {} diff: {} chars, truncated={}",
        source.as_str(),
        text.chars().count(),
        truncated
    );

    Ok(DiffSnapshot {
        text,
        source,
        truncated,
    })
}

/// Render a diff as unified patch text.
fn patch_text(diff: &Diff<'_>) -> Result<String, DiffError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(DiffError::DiffFailed)?;
    Ok(text)
}

/// Cut `text` to `max_len` characters on a char boundary.
pub fn truncate_diff(mut text: String, max_len: usize) -> (String, bool) {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => {
            text.truncate(cut);
            text.push_str(TRUNCATION_SUFFIX);
            (text, true)
        }
        None => (text, false),
    }
}
