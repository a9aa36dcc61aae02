use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding the per-project files, relative to the repository root.
pub const CONFIG_DIR: &str = ".git-commit";

/// Which implementation talks to git.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GitBackend {
    /// Spawn the `git` binary.
    #[default]
    Cli,
    /// Use libgit2 in-process.
    Libgit2,
}

/// Contents of `.git-commit/config.toml`. Every key is optional.
///
/// ```toml
/// backend = "libgit2"
/// verbose = true
/// ignore_file = ".git-commit/ignore"
/// clipboard_command = ["wl-copy"]
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub backend: GitBackend,
    pub verbose: bool,
    pub ignore_file: PathBuf,
    pub prompt_file: PathBuf,
    pub custom_prompts_dir: PathBuf,
    pub clipboard_command: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let dir = Path::new(CONFIG_DIR);
        Self {
            backend: GitBackend::default(),
            verbose: false,
            ignore_file: dir.join("ignore"),
            prompt_file: dir.join("prompt.md"),
            custom_prompts_dir: dir.join("custom-instructions"),
            clipboard_command: default_clipboard_command(),
        }
    }
}

fn default_clipboard_command() -> Vec<String> {
    let argv: &[&str] = if cfg!(target_os = "macos") {
        &["pbcopy"]
    } else if cfg!(windows) {
        &["clip"]
    } else {
        &["xclip", "-selection", "clipboard"]
    };
    argv.iter().map(|s| s.to_string()).collect()
}

/// Resource locations for one workflow run, resolved against the repository
/// root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub ignore_file: PathBuf,
}

pub struct ConfigManager {
    config_path: PathBuf,
    repo_root: PathBuf,
}

impl ConfigManager {
    /// Finds the repository containing the current directory.
    pub fn new() -> Result<Self> {
        let repo_root = find_git_root()?;
        Ok(Self::new_at(repo_root))
    }

    /// Uses `repo_root` as given, without searching.
    pub fn new_at<P: AsRef<Path>>(repo_root: P) -> Self {
        let repo_root = repo_root.as_ref().to_path_buf();
        let config_path = repo_root.join(CONFIG_DIR).join("config.toml");
        Self {
            config_path,
            repo_root,
        }
    }

    pub fn get_repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Resolves a configured path against the repository root. Absolute
    /// paths are kept.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.repo_root.join(path)
    }

    /// Builds the workflow configuration from the loaded settings.
    pub fn workflow_config(&self, config: &AppConfig) -> WorkflowConfig {
        WorkflowConfig {
            ignore_file: self.resolve(&config.ignore_file),
        }
    }
}

pub trait ConfigProvider {
    fn load_config(&self) -> Result<AppConfig>;
    fn get_config_path(&self) -> &Path;
}

impl ConfigProvider for ConfigManager {
    fn load_config(&self) -> Result<AppConfig> {
        let path = self.get_config_path();
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}

fn find_git_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    let mut dir = current_dir.as_path();

    loop {
        if dir.join(".git").exists() {
            return Ok(dir.to_path_buf());
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => anyhow::bail!("Not in a Git repository"),
        }
    }
}
