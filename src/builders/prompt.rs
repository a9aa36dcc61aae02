use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::reporter::Reporter;

/// Marker that pulls a file or directory into the prompt.
const CONTEXT_DIRECTIVE: &str = "@context:";

/// Used when the project has neither a named nor a project prompt.
pub const DEFAULT_PROMPT: &str = "\
Write a git branch name and a commit message for the diff above.

Branch name: lowercase words joined by hyphens, prefixed with one of
feature/, bugfix/, hotfix/, docs/, refactor/, test/ or chore/.

Commit message: Conventional Commits. The header is `<type>(<scope>): <summary>`
in the imperative mood, at most 50 characters and without a trailing period.
Types: feat, fix, docs, refactor, test, chore, perf, style, build, ci.
After a blank line, list the changes as a markdown bullet list, one change per
line, each line at most 72 characters. Put `BREAKING CHANGE:` and ticket
references in a footer.

Reply with the branch name on the first line followed by the commit message,
and nothing else.";

/// Supplies the instructions appended after the diff.
pub trait PromptSource {
    /// Returns the prompt text for `name`, or the project default when `name`
    /// is `None`. Never fails: problems are reported and a fallback is used.
    fn prompt_text(&self, name: Option<&str>, reporter: &dyn Reporter) -> String;
}

/// Reads prompts from the project's `.git-commit` directory.
///
/// Lookup order for a named prompt is `<custom_dir>/<name>.md`, then the
/// project prompt file, then [`DEFAULT_PROMPT`]. Blank files count as absent.
pub struct FilePromptSource {
    prompt_file: PathBuf,
    custom_dir: PathBuf,
    context_root: PathBuf,
}

impl FilePromptSource {
    /// # Arguments
    /// * `prompt_file`: The project-wide prompt override.
    /// * `custom_dir`: Directory of named `*.md` prompts.
    /// * `context_root`: Base for relative `@context:` paths, normally the
    ///   repository root.
    pub fn new(prompt_file: PathBuf, custom_dir: PathBuf, context_root: PathBuf) -> Self {
        Self {
            prompt_file,
            custom_dir,
            context_root,
        }
    }

    /// Names of the prompts in the custom directory, sorted. A missing or
    /// unreadable directory has none.
    pub fn available_prompts(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.custom_dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    fn custom_prompt(&self, name: &str) -> Result<String> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            bail!("'{name}' is not a valid prompt name");
        }
        let path = self.custom_dir.join(format!("{name}.md"));
        if !path.exists() {
            bail!("custom prompt file '{}' not found", path.display());
        }
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read custom prompt file '{}'", path.display()))
    }

    /// The project prompt, or `None` when the file does not exist.
    fn project_prompt(&self) -> Result<Option<String>> {
        if !self.prompt_file.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.prompt_file)
            .with_context(|| format!("failed to read {}", self.prompt_file.display()))?;
        Ok(Some(content))
    }

    fn raw_prompt(&self, name: Option<&str>, reporter: &dyn Reporter) -> String {
        if let Some(name) = name {
            match self.custom_prompt(name) {
                Ok(content) if !content.trim().is_empty() => return content,
                Ok(_) => reporter.warn(&format!("Custom prompt '{name}' is empty, using standard")),
                Err(e) => reporter.warn(&format!(
                    "Error reading custom prompt '{name}': {e:#}, using standard"
                )),
            }
        }

        match self.project_prompt() {
            Ok(Some(content)) if !content.trim().is_empty() => content,
            Ok(_) => DEFAULT_PROMPT.to_string(),
            Err(e) => {
                reporter.warn(&format!("Error reading project prompt: {e:#}, using standard"));
                DEFAULT_PROMPT.to_string()
            }
        }
    }
}

impl PromptSource for FilePromptSource {
    fn prompt_text(&self, name: Option<&str>, reporter: &dyn Reporter) -> String {
        let raw = self.raw_prompt(name, reporter);
        match expand_directives(&raw, &self.context_root) {
            Ok(expanded) => expanded,
            Err(e) => {
                reporter.warn(&format!("Error processing prompt directives: {e:#}"));
                raw
            }
        }
    }
}

/// Replaces every line containing `@context: <path>` with the referenced
/// content.
///
/// A file becomes a `<context file="...">` block. A directory becomes a
/// `<directory name="..." path="...">` block holding every file beneath it,
/// in sorted order. Relative paths resolve against `root`.
pub fn expand_directives(content: &str, root: &Path) -> Result<String> {
    let mut result = Vec::new();

    for line in content.split('\n') {
        let Some((_, target)) = line.split_once(CONTEXT_DIRECTIVE) else {
            result.push(line.to_string());
            continue;
        };

        let target = target.trim();
        if target.is_empty() {
            bail!("{CONTEXT_DIRECTIVE} directive without a path");
        }
        let path = root.join(target);
        let metadata = fs::metadata(&path)
            .with_context(|| format!("error getting file info for {target}"))?;

        if metadata.is_dir() {
            result.push(render_directory(&path, target)?);
        } else {
            result.push(render_file(&path, target)?);
        }
    }

    Ok(result.join("\n"))
}

fn render_file(path: &Path, display: &str) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("error reading context file {display}"))?;
    Ok(format!("<context file=\"{display}\">\n{content}\n</context>"))
}

fn render_directory(path: &Path, display: &str) -> Result<String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display.to_string());
    let body = render_directory_entries(path, "")
        .with_context(|| format!("error processing directory {display}"))?;
    Ok(format!(
        "<directory name=\"{name}\" path=\"{display}\">\n{body}</directory>"
    ))
}

/// Renders the children of `dir`. `prefix` is the path of `dir` relative to
/// the directory named in the directive.
fn render_directory_entries(dir: &Path, prefix: &str) -> Result<String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    let mut out = String::new();
    for entry in entries {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        if entry.is_dir() {
            let nested = render_directory_entries(&entry, &relative)?;
            out.push_str(&format!(
                "<directory name=\"{name}\" path=\"{relative}\">\n{nested}</directory>\n"
            ));
        } else {
            out.push_str(&render_file(&entry, &relative)?);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Joins the diff and the instructions into the text handed to the user.
pub fn compose(diff: &str, prompt: &str) -> String {
    format!("<diff>\n{diff}\n</diff>\n\n{prompt}")
}
