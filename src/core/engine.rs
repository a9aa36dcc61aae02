use thiserror::Error;

use crate::builders::importer::PatternImporter;
use crate::builders::patterns::{self, IgnorePattern};
use crate::builders::reporter::Reporter;
use crate::core::config::WorkflowConfig;
use crate::core::diff::{self, StagedDiff};
use crate::core::git::{GitClient, GitError};
use crate::core::stage::{Stage, StageError, Unstaged};

/// A run that ended without producing a diff.
///
/// Whenever files had been unstaged before the failure, they were restored
/// first; `restore_error` says whether that restoration failed too.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to list staged files")]
    StageInspection(#[source] GitError),
    #[error(transparent)]
    Unstage(StageError),
    #[error("failed to capture the staged diff")]
    DiffCapture {
        #[source]
        source: GitError,
        restore_error: Option<StageError>,
    },
}

/// The diff that survived the ignore list.
#[derive(Debug)]
pub struct PreparedDiff {
    /// Trimmed `git diff --staged` output, never empty.
    pub diff: String,
    /// Files that were kept out of the diff.
    pub ignored: Vec<String>,
    /// Set when the ignored files could not be put back on the stage.
    pub restore_error: Option<StageError>,
}

/// How a run that did not fail ended.
#[derive(Debug)]
pub enum WorkflowOutcome {
    Ready(PreparedDiff),
    /// Nothing staged once the ignored files were set aside.
    NoChanges {
        ignored: Vec<String>,
        restore_error: Option<StageError>,
    },
}

impl WorkflowOutcome {
    pub fn restore_error(&self) -> Option<&StageError> {
        match self {
            WorkflowOutcome::Ready(prepared) => prepared.restore_error.as_ref(),
            WorkflowOutcome::NoChanges { restore_error, .. } => restore_error.as_ref(),
        }
    }
}

/// Sequences one staged-diff run:
///
/// ```text
/// load patterns -> list staged -> select ignored -> unstage ignored
///   -> capture diff -> restore ignored -> diff | no changes | error
/// ```
///
/// The ignored files are restored on every path that unstaged them, so the
/// staged set after `run` equals the staged set before it. Only one run may
/// operate on a working tree at a time; that is up to the caller.
pub struct DiffEngine<'a> {
    config: WorkflowConfig,
    git: &'a dyn GitClient,
    importer: &'a dyn PatternImporter,
    reporter: &'a dyn Reporter,
}

impl<'a> DiffEngine<'a> {
    pub fn new(
        config: WorkflowConfig,
        git: &'a dyn GitClient,
        importer: &'a dyn PatternImporter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            git,
            importer,
            reporter,
        }
    }

    pub fn run(&self) -> Result<WorkflowOutcome, WorkflowError> {
        let patterns = self.load_patterns();

        let stage = Stage::new(self.git);
        let staged = stage.list_staged().map_err(|e| {
            self.report_git_failure("Error getting staged files", &e);
            WorkflowError::StageInspection(e)
        })?;
        self.reporter
            .debug(&format!("Found staged files: {}", staged.join(", ")));

        let ignored = patterns::select_ignored(&patterns, &staged);
        self.reporter
            .debug(&format!("Files to ignore: {}", ignored.join(", ")));

        if !ignored.is_empty() {
            self.reporter.info(&format!(
                "Removing {} file(s) from the stage:",
                ignored.len()
            ));
            self.reporter.list('-', &ignored);
        }

        let unstaged = stage.unstage(ignored).map_err(|e| {
            self.report_git_failure(&e.to_string(), e.git_error());
            WorkflowError::Unstage(e)
        })?;

        match diff::capture_staged_diff(self.git) {
            Err(source) => {
                self.report_git_failure("Error executing git diff", &source);
                if !unstaged.is_empty() {
                    self.reporter
                        .info("An error occurred, returning files to the stage...");
                }
                let (_, restore_error) = self.restore(unstaged);
                Err(WorkflowError::DiffCapture {
                    source,
                    restore_error,
                })
            }
            Ok(StagedDiff::Empty) => {
                if !unstaged.is_empty() {
                    self.reporter
                        .info("No changes found, returning files to the stage...");
                }
                let (ignored, restore_error) = self.restore(unstaged);
                Ok(WorkflowOutcome::NoChanges {
                    ignored,
                    restore_error,
                })
            }
            Ok(StagedDiff::Changes(diff)) => {
                let (ignored, restore_error) = self.restore(unstaged);
                Ok(WorkflowOutcome::Ready(PreparedDiff {
                    diff,
                    ignored,
                    restore_error,
                }))
            }
        }
    }

    fn load_patterns(&self) -> Vec<IgnorePattern> {
        let imported = self.importer.import(&self.config.ignore_file);
        if let Some(error) = &imported.error {
            self.reporter.warn(&format!(
                "{error}; continuing with {} pattern(s)",
                imported.patterns.len()
            ));
        }
        let listed: Vec<&str> = imported.patterns.iter().map(IgnorePattern::as_str).collect();
        self.reporter.debug(&format!(
            "Obtained patterns from {}: {}",
            self.config.ignore_file.display(),
            listed.join(", ")
        ));
        imported.patterns
    }

    /// Puts the unstaged files back and reports how it went.
    fn restore(&self, unstaged: Unstaged<'_>) -> (Vec<String>, Option<StageError>) {
        let paths = unstaged.paths().to_vec();
        if paths.is_empty() {
            return (paths, unstaged.restore().err());
        }

        self.reporter.info(&format!(
            "Returning {} file(s) to the stage:",
            paths.len()
        ));
        self.reporter.list('+', &paths);

        match unstaged.restore() {
            Ok(()) => {
                self.reporter.info("Files successfully returned to the stage.");
                (paths, None)
            }
            Err(e) => {
                self.reporter.warn(&format!("{e}: {}", e.git_error()));
                self.reporter.warn(&format!(
                    "Your stage no longer matches what you staged; stage these files again: {}",
                    paths.join(" ")
                ));
                (paths, Some(e))
            }
        }
    }

    fn report_git_failure(&self, context: &str, error: &GitError) {
        self.reporter.error(&format!("{context}: {error}"));
    }
}
