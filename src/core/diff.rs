use crate::core::git::{GitClient, GitError};

/// What the staged diff looked like once the ignored files were off the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedDiff {
    /// Nothing but whitespace: there is nothing left to describe.
    Empty,
    /// The trimmed diff text.
    Changes(String),
}

/// Captures the staged diff and trims surrounding whitespace.
///
/// A command failure is returned as-is; an empty result is not an error and
/// comes back as [`StagedDiff::Empty`].
pub fn capture_staged_diff(git: &dyn GitClient) -> Result<StagedDiff, GitError> {
    let raw = git.staged_diff_text()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(StagedDiff::Empty)
    } else {
        Ok(StagedDiff::Changes(trimmed.to_string()))
    }
}
