//! Where a generated commit message goes.

use std::io::Write;
use std::path::PathBuf;

use git2::{Commit, ErrorCode, IndexAddOption, Oid, Repository};
use tracing::{debug, info};

use crate::error::SinkError;
use crate::git::diff::DiffSource;

/// Receives a non-empty generated message.
#[cfg_attr(test, mockall::automock)]
pub trait CommitMessageSink: Send + Sync {
    /// `source` says which diff the message describes.
    fn deliver(&self, message: &str, source: DiffSource) -> Result<(), SinkError>;
}

/// Print the message on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl CommitMessageSink for StdoutSink {
    fn deliver(&self, message: &str, _source: DiffSource) -> Result<(), SinkError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{message}").map_err(SinkError::WriteFailed)
    }
}

/// Write `.git/COMMIT_EDITMSG`, where `git commit` editors pick it up.
#[derive(Debug, Clone)]
pub struct EditMsgSink {
    repo_path: PathBuf,
}

impl EditMsgSink {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl CommitMessageSink for EditMsgSink {
    fn deliver(&self, message: &str, _source: DiffSource) -> Result<(), SinkError> {
        let repo = Repository::discover(&self.repo_path).map_err(SinkError::OpenRepository)?;
        let path = repo.path().join("COMMIT_EDITMSG");
        std::fs::write(&path, format!("{message}\n")).map_err(SinkError::WriteFailed)?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Commit the index with the message.
///
/// A message written from the unstaged fallback describes the working tree,
/// so everything is staged first (like `git add -A`).
#[derive(Debug, Clone)]
pub struct CommitSink {
    repo_path: PathBuf,
}

impl CommitSink {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl CommitMessageSink for CommitSink {
    fn deliver(&self, message: &str, source: DiffSource) -> Result<(), SinkError> {
        let repo = Repository::discover(&self.repo_path).map_err(SinkError::OpenRepository)?;
        let oid = commit_index(&repo, message, source == DiffSource::Unstaged)?;
        println!("Created commit {}", oid);
        Ok(())
    }
}

/// Create a commit on HEAD from the index, optionally staging everything first.
pub fn commit_index(repo: &Repository, message: &str, stage_all: bool) -> Result<Oid, SinkError> {
    let mut index = repo.index().map_err(SinkError::StagingFailed)?;
    if stage_all {
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(SinkError::StagingFailed)?;
        // Picks up deletions, which add_all leaves alone.
        index
            .update_all(["*"].iter(), None)
            .map_err(SinkError::StagingFailed)?;
        index.write().map_err(SinkError::StagingFailed)?;
        debug!("Staged all working tree changes");
    }

    let tree_id = index.write_tree().map_err(SinkError::StagingFailed)?;
    let tree = repo.find_tree(tree_id).map_err(SinkError::CommitFailed)?;
    let sig = repo.signature().map_err(SinkError::SignatureMissing)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(SinkError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(SinkError::CommitFailed(e)),
    };
    let parents: Vec<&Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(SinkError::CommitFailed)
}
