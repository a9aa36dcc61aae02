// This file is the module declaration file for the `core` module.
// It declares the submodules under `src/core/` and makes them public to the
// rest of the crate (and to the integration tests through `lib.rs`).

// `config` module:
// Locates the repository root, loads the optional `.git-commit/config.toml`
// into `AppConfig` and resolves the paths a workflow run needs.
pub mod config;

// `diff` module:
// Captures the staged diff and tells an empty result apart from real changes.
pub mod diff;

// `engine` module:
// The `DiffEngine` orchestrates one run: load patterns, list staged files,
// unstage the ignored ones, capture the diff and restore the stage on every
// exit path.
pub mod engine;

// `git` module:
// The `GitClient` trait plus its two backends, `GitCli` (spawns `git`) and
// `Git2Client` (libgit2).
pub mod git;

// `stage` module:
// Stage inspection and the invertible unstage/restage pair, including the
// `Unstaged` record that guarantees restoration.
pub mod stage;
