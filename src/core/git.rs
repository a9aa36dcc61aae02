use git2::{
    DiffFormat, DiffOptions, Index, IndexEntry, IndexTime, ObjectType, Oid, Repository, Tree,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// A failed version-control operation.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary could not be started at all.
    #[error("failed to run `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    /// `git` ran but exited unsuccessfully. `stderr` is its diagnostic text.
    #[error("`git {command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("libgit2: {0}")]
    Libgit2(#[from] git2::Error),
}

impl GitError {
    /// The diagnostic text the failing command printed, if there was any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            GitError::Failed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// What the stage held for one path before the path was unstaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    pub path: String,
    /// The stage-0 index entry, or `None` when the index had no entry for
    /// the path (a staged deletion).
    pub blob: Option<IndexBlob>,
}

/// Mode and object id of an index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlob {
    pub mode: u32,
    /// Hex object id.
    pub oid: String,
}

/// Trait defining the stage operations required by the workflow.
///
/// Paths are repository-relative and use `/`, exactly as `git diff --name-only`
/// prints them. Every method blocks until the operation has finished.
pub trait GitClient {
    /// Lists the paths that currently have staged changes. A rename is
    /// listed as its two paths.
    fn list_staged_paths(&self) -> Result<Vec<String>, GitError>;

    /// Returns the staged diff as unified patch text, untrimmed.
    fn staged_diff_text(&self) -> Result<String, GitError>;

    /// Records the index entry of every path, in the order given.
    fn snapshot_stage(&self, paths: &[String]) -> Result<Vec<StagedEntry>, GitError>;

    /// Writes recorded entries back into the index exactly as they were:
    /// the same blob and mode, or no entry at all.
    fn add_to_stage(&self, entries: &[StagedEntry]) -> Result<(), GitError>;

    /// Removes the given paths from the stage, keeping the working tree
    /// untouched (`git reset`).
    fn reset_from_stage(&self, paths: &[String]) -> Result<(), GitError>;
}

/// Runs the `git` binary found on `PATH`.
///
/// Every command runs in the repository root, so the repository-relative
/// paths reported by `list_staged_paths` can be handed straight back to the
/// other operations whatever the caller's directory.
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new<P: AsRef<Path>>(workdir: P) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        self.execute(args, None)
    }

    fn run_with_paths(&self, args: &[&str], paths: &[String]) -> Result<String, GitError> {
        let mut full: Vec<&str> = args.to_vec();
        full.push("--");
        full.extend(paths.iter().map(String::as_str));
        self.run(&full)
    }

    fn execute(&self, args: &[&str], input: Option<&str>) -> Result<String, GitError> {
        let command = args.join(" ");
        let spawn_error = |source: io::Error| GitError::Spawn {
            command: command.clone(),
            source,
        };

        let stdin = if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(input) = input
            && let Some(mut pipe) = child.stdin.take()
        {
            pipe.write_all(input.as_bytes()).map_err(spawn_error)?;
        }

        let output = child.wait_with_output().map_err(spawn_error)?;
        if !output.status.success() {
            return Err(GitError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parses `git ls-files -s -z` output into stage-0 entries keyed by path.
fn parse_ls_files(output: &str) -> HashMap<&str, IndexBlob> {
    let mut blobs = HashMap::new();
    for record in output.split('\0').filter(|r| !r.is_empty()) {
        let Some((meta, path)) = record.split_once('\t') else {
            continue;
        };
        let mut fields = meta.split(' ');
        let (Some(mode), Some(oid), Some("0")) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if let Ok(mode) = u32::from_str_radix(mode, 8) {
            blobs.insert(
                path,
                IndexBlob {
                    mode,
                    oid: oid.to_string(),
                },
            );
        }
    }
    blobs
}

impl GitClient for GitCli {
    fn list_staged_paths(&self) -> Result<Vec<String>, GitError> {
        // NUL-separated output is never quoted, even for non-ASCII names.
        let output = self.run(&["diff", "--staged", "--name-only", "--no-renames", "-z"])?;
        Ok(output
            .split('\0')
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    fn staged_diff_text(&self) -> Result<String, GitError> {
        self.run(&["diff", "--staged", "--no-color", "--no-ext-diff", "--no-renames"])
    }

    fn snapshot_stage(&self, paths: &[String]) -> Result<Vec<StagedEntry>, GitError> {
        let output = self.run_with_paths(&["--literal-pathspecs", "ls-files", "-s", "-z"], paths)?;
        let mut blobs = parse_ls_files(&output);
        Ok(paths
            .iter()
            .map(|path| StagedEntry {
                path: path.clone(),
                blob: blobs.remove(path.as_str()),
            })
            .collect())
    }

    fn add_to_stage(&self, entries: &[StagedEntry]) -> Result<(), GitError> {
        // Mode 0 removes the entry.
        let removed = Oid::zero().to_string();
        let mut info = String::new();
        for entry in entries {
            match &entry.blob {
                Some(blob) => {
                    info.push_str(&format!("{:o} {}\t{}\0", blob.mode, blob.oid, entry.path))
                }
                None => info.push_str(&format!("0 {removed}\t{}\0", entry.path)),
            }
        }
        self.execute(&["update-index", "-z", "--index-info"], Some(&info))
            .map(|_| ())
    }

    fn reset_from_stage(&self, paths: &[String]) -> Result<(), GitError> {
        self.run_with_paths(&["--literal-pathspecs", "reset", "-q"], paths)
            .map(|_| ())
    }
}

/// Concrete implementation of `GitClient` using the git2 crate.
pub struct Git2Client {
    repo: Repository,
}

impl Git2Client {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let repo = Repository::open(path)?;
        Ok(Self { repo })
    }

    /// The index as it is on disk right now. Another process (or `GitCli`)
    /// may have rewritten it since the repository was opened.
    fn fresh_index(&self) -> Result<Index, GitError> {
        let mut index = self.repo.index()?;
        index.read(true)?;
        Ok(index)
    }

    /// The tree staged changes are measured against: `HEAD`, or the empty
    /// tree before the first commit.
    fn base_tree(&self) -> Result<Tree<'_>, GitError> {
        match self.repo.head() {
            Ok(head) => Ok(head.peel_to_tree()?),
            Err(_) => {
                let empty = self.repo.treebuilder(None)?.write()?;
                Ok(self.repo.find_tree(empty)?)
            }
        }
    }

    fn staged_diff(&self) -> Result<git2::Diff<'_>, GitError> {
        let index = self.fresh_index()?;
        let tree = self.base_tree()?;
        let mut options = DiffOptions::new();
        Ok(self
            .repo
            .diff_tree_to_index(Some(&tree), Some(&index), Some(&mut options))?)
    }
}

/// An index entry carrying only what the stage needs: path, mode and blob.
/// Zeroed stat data makes git re-check the working tree file later.
fn index_entry(path: &str, blob: &IndexBlob) -> Result<IndexEntry, GitError> {
    Ok(IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: blob.mode,
        uid: 0,
        gid: 0,
        file_size: 0,
        id: Oid::from_str(&blob.oid)?,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    })
}

impl GitClient for Git2Client {
    fn list_staged_paths(&self) -> Result<Vec<String>, GitError> {
        let diff = self.staged_diff()?;
        let mut staged = Vec::new();
        for delta in diff.deltas() {
            let file = if delta.new_file().path().is_some() {
                delta.new_file()
            } else {
                delta.old_file()
            };
            if let Some(path) = file.path() {
                staged.push(path.to_string_lossy().replace('\\', "/"));
            }
        }
        Ok(staged)
    }

    fn staged_diff_text(&self) -> Result<String, GitError> {
        let diff = self.staged_diff()?;
        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if let origin @ ('+' | '-' | ' ') = line.origin() {
                text.push(origin);
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }

    fn snapshot_stage(&self, paths: &[String]) -> Result<Vec<StagedEntry>, GitError> {
        let index = self.fresh_index()?;
        Ok(paths
            .iter()
            .map(|path| StagedEntry {
                path: path.clone(),
                blob: index.get_path(Path::new(path), 0).map(|entry| IndexBlob {
                    mode: entry.mode,
                    oid: entry.id.to_string(),
                }),
            })
            .collect())
    }

    fn add_to_stage(&self, entries: &[StagedEntry]) -> Result<(), GitError> {
        let mut index = self.fresh_index()?;
        for entry in entries {
            match &entry.blob {
                Some(blob) => index.add(&index_entry(&entry.path, blob)?)?,
                None => index.remove_path(Path::new(&entry.path))?,
            }
        }
        index.write()?;
        Ok(())
    }

    fn reset_from_stage(&self, paths: &[String]) -> Result<(), GitError> {
        let specs = paths.iter().map(String::as_str);
        match self.repo.head() {
            Ok(head) => {
                let target = head.peel(ObjectType::Commit)?;
                self.repo.reset_default(Some(&target), specs)?;
            }
            // Unborn branch: resetting means dropping the entries.
            Err(_) => self.repo.reset_default(None, specs)?,
        }
        Ok(())
    }
}
