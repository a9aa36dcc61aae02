use thiserror::Error;

use crate::core::git::{GitClient, GitError, StagedEntry};

/// A failed stage mutation, with the files it was about.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to remove {} file(s) from the stage", paths.len())]
    Unstage {
        paths: Vec<String>,
        #[source]
        source: GitError,
    },
    #[error("failed to return {} file(s) to the stage: {}", paths.len(), paths.join(", "))]
    Restage {
        paths: Vec<String>,
        #[source]
        source: GitError,
    },
}

impl StageError {
    pub fn paths(&self) -> &[String] {
        match self {
            StageError::Unstage { paths, .. } | StageError::Restage { paths, .. } => paths,
        }
    }

    pub fn git_error(&self) -> &GitError {
        match self {
            StageError::Unstage { source, .. } | StageError::Restage { source, .. } => source,
        }
    }
}

/// Reads and mutates the stage through a [`GitClient`].
///
/// Both mutations are no-ops for an empty path list and never reach the
/// client in that case.
pub struct Stage<'a> {
    git: &'a dyn GitClient,
}

impl<'a> Stage<'a> {
    pub fn new(git: &'a dyn GitClient) -> Self {
        Self { git }
    }

    /// Lists the currently staged files.
    pub fn list_staged(&self) -> Result<Vec<String>, GitError> {
        self.git.list_staged_paths()
    }

    /// Removes `paths` from the stage and returns the record needed to put
    /// them back.
    ///
    /// The index entry of every path is recorded first, so restoring brings
    /// back the staged content itself (a partially staged file, a staged
    /// deletion) rather than the working tree. On failure nothing is
    /// returned to restore: `git reset` either updates the index or leaves
    /// it alone.
    pub fn unstage(&self, paths: Vec<String>) -> Result<Unstaged<'a>, StageError> {
        if paths.is_empty() {
            return Ok(Unstaged {
                git: self.git,
                paths,
                entries: Vec::new(),
                restored: false,
            });
        }

        let entries = match self.git.snapshot_stage(&paths) {
            Ok(entries) => entries,
            Err(source) => return Err(StageError::Unstage { paths, source }),
        };
        if let Err(source) = self.git.reset_from_stage(&paths) {
            return Err(StageError::Unstage { paths, source });
        }

        Ok(Unstaged {
            git: self.git,
            paths,
            entries,
            restored: false,
        })
    }
}

fn restage(
    git: &dyn GitClient,
    paths: &[String],
    entries: &[StagedEntry],
) -> Result<(), StageError> {
    if entries.is_empty() {
        return Ok(());
    }
    git.add_to_stage(entries).map_err(|source| StageError::Restage {
        paths: paths.to_vec(),
        source,
    })
}

/// Files that were taken off the stage and still have to go back.
///
/// Consume it with [`Unstaged::restore`] so a failure can be reported. If it
/// is dropped unrestored instead (a panic between unstaging and restoring),
/// `Drop` restores the files and logs any error, so the stage is never left
/// mutated.
#[must_use = "unstaged files must be restored"]
pub struct Unstaged<'a> {
    git: &'a dyn GitClient,
    paths: Vec<String>,
    entries: Vec<StagedEntry>,
    restored: bool,
}

impl Unstaged<'_> {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns every file to the stage as it was recorded. Runs once: the
    /// record is consumed.
    pub fn restore(mut self) -> Result<(), StageError> {
        self.restored = true;
        restage(self.git, &self.paths, &self.entries)
    }
}

impl Drop for Unstaged<'_> {
    fn drop(&mut self) {
        if self.restored || self.paths.is_empty() {
            return;
        }
        if let Err(e) = restage(self.git, &self.paths, &self.entries) {
            tracing::error!("{e}: {}", e.git_error());
        }
    }
}
