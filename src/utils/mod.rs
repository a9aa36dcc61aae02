use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::builders::delivery::Deliver;
use crate::builders::importer::FileImporter;
use crate::builders::prompt::{self, FilePromptSource, PromptSource};
use crate::builders::reporter::Reporter;
use crate::core::config::{AppConfig, ConfigManager, ConfigProvider, GitBackend, WorkflowConfig};
use crate::core::engine::{DiffEngine, WorkflowOutcome};
use crate::core::git::{Git2Client, GitCli, GitClient};

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Delivered,
    NoChanges,
}

/// The repository being worked on and its loaded settings.
pub struct Project {
    manager: ConfigManager,
    config: AppConfig,
}

impl Project {
    /// Finds the repository containing the current directory.
    pub fn discover() -> Result<Self> {
        Self::load(ConfigManager::new()?)
    }

    pub fn at<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        Self::load(ConfigManager::new_at(repo_root))
    }

    fn load(manager: ConfigManager) -> Result<Self> {
        let config = manager.load_config()?;
        Ok(Self { manager, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Location of `config.toml`, whether or not it exists.
    pub fn config_path(&self) -> &Path {
        self.manager.get_config_path()
    }

    pub fn root(&self) -> &Path {
        self.manager.get_repo_root()
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        self.manager.workflow_config(&self.config)
    }

    pub fn prompt_source(&self) -> FilePromptSource {
        FilePromptSource::new(
            self.manager.resolve(&self.config.prompt_file),
            self.manager.resolve(&self.config.custom_prompts_dir),
            self.root().to_path_buf(),
        )
    }

    /// Opens the configured git backend on the repository root.
    pub fn git_client(&self) -> Result<Box<dyn GitClient>> {
        let client: Box<dyn GitClient> = match self.config.backend {
            GitBackend::Cli => Box::new(GitCli::new(self.root())),
            GitBackend::Libgit2 => Box::new(Git2Client::new(self.root())?),
        };
        Ok(client)
    }
}

/// Runs the staged-diff workflow, appends the prompt and hands the result
/// to `sink`.
///
/// Used unchanged by the clipboard and the print-only front ends. A sink
/// failure is not fatal: the text is printed so it can be copied by hand.
pub fn generate(
    project: &Project,
    prompt_name: Option<&str>,
    sink: &dyn Deliver,
    reporter: &dyn Reporter,
) -> Result<RunStatus> {
    reporter.debug(&format!(
        "Using {} ({:?} backend)",
        project.config_path().display(),
        project.config().backend
    ));
    let git = project.git_client()?;
    let importer = FileImporter::new();
    let engine = DiffEngine::new(project.workflow_config(), git.as_ref(), &importer, reporter);

    let prepared = match engine.run()? {
        WorkflowOutcome::NoChanges { .. } => {
            eprintln!(
                "{}",
                "No changes detected. Please use 'git add' to add files to the stage.".yellow()
            );
            return Ok(RunStatus::NoChanges);
        }
        WorkflowOutcome::Ready(prepared) => prepared,
    };

    let instructions = project.prompt_source().prompt_text(prompt_name, reporter);
    let text = prompt::compose(&prepared.diff, &instructions);

    match sink.deliver(&text) {
        Ok(()) => eprintln!("{} {}", "✓".green().bold(), sink.confirmation()),
        Err(e) => {
            reporter.warn(&format!("{e:#}"));
            println!("Please copy manually:\n---\n{text}\n---");
        }
    }

    Ok(RunStatus::Delivered)
}

/// Text shown after the option list of `--help`.
pub fn help_footer(project: Option<&Project>) -> String {
    let mut footer = String::from(
        "Configuration:\n  \
         .git-commit/ignore                 patterns of staged files to leave out of the diff\n  \
         .git-commit/prompt.md              project prompt replacing the built-in one\n  \
         .git-commit/custom-instructions/   named prompts, e.g. mark.md -> git-commit-prompt mark\n  \
         .git-commit/config.toml            backend, paths and clipboard command\n",
    );

    let prompts = project
        .map(|p| p.prompt_source().available_prompts())
        .unwrap_or_default();
    if prompts.is_empty() {
        footer.push_str("\nNo custom prompts found.");
    } else {
        footer.push_str("\nAvailable custom prompts:");
        for name in prompts {
            footer.push_str(&format!("\n  git-commit-prompt {name}"));
        }
    }
    footer
}
