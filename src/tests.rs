#[cfg(test)]
mod tests {
    use crate::builders::importer::{FileImporter, StaticImporter};
    use crate::builders::reporter::{Level, MemoryReporter};
    use crate::core::config::{ConfigManager, ConfigProvider, WorkflowConfig};
    use crate::core::engine::{DiffEngine, WorkflowOutcome};
    use crate::core::git::{Git2Client, GitCli, GitClient};
    use crate::core::stage::Stage;
    use git2::{Oid, Repository, Signature};
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    fn setup_test_repo() -> (TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write_file(repo: &Repository, path: &str, content: &str) {
        let full = repo.workdir().unwrap().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    /// Writes and stages files, reloading the index first so changes made
    /// by the code under test are not overwritten.
    fn stage_files(repo: &Repository, files: &[(&str, &str)]) {
        let mut index = repo.index().unwrap();
        index.read(true).unwrap();
        for (path, content) in files {
            write_file(repo, path, content);
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
    }

    fn commit_files(repo: &Repository, files: &[(&str, &str)]) {
        stage_files(repo, files);
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Test User", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
            .unwrap();
    }

    /// A repository with one commit and `a.go` plus `b.log` staged on top.
    fn repo_with_staged_changes() -> (TempDir, Repository) {
        let (dir, repo) = setup_test_repo();
        commit_files(&repo, &[("README.md", "readme\n")]);
        stage_files(
            &repo,
            &[("a.go", "package main\n"), ("b.log", "noise\n")],
        );
        (dir, repo)
    }

    fn staged_set(git: &dyn GitClient) -> BTreeSet<String> {
        git.list_staged_paths().unwrap().into_iter().collect()
    }

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn check_backend_round_trip(git: &dyn GitClient) {
        assert_eq!(staged_set(git), set(&["a.go", "b.log"]));

        let stage = Stage::new(git);
        let unstaged = stage.unstage(vec!["b.log".to_string()]).unwrap();
        assert_eq!(staged_set(git), set(&["a.go"]));

        let diff = git.staged_diff_text().unwrap();
        assert!(diff.contains("+package main"));
        assert!(!diff.contains("b.log"));

        unstaged.restore().unwrap();
        assert_eq!(staged_set(git), set(&["a.go", "b.log"]));
    }

    #[test]
    fn test_git2_backend_round_trip() {
        let (dir, _repo) = repo_with_staged_changes();
        let git = Git2Client::new(dir.path()).unwrap();
        check_backend_round_trip(&git);
    }

    #[test]
    fn test_cli_backend_round_trip() {
        let (dir, _repo) = repo_with_staged_changes();
        let git = GitCli::new(dir.path());
        check_backend_round_trip(&git);
    }

    #[test]
    fn test_backends_agree_on_staged_paths() {
        let (dir, repo) = repo_with_staged_changes();
        stage_files(&repo, &[("nested/dir/c.rs", "fn main() {}\n")]);

        let cli = GitCli::new(dir.path());
        let lib = Git2Client::new(dir.path()).unwrap();
        assert_eq!(staged_set(&cli), staged_set(&lib));
        assert!(staged_set(&cli).contains("nested/dir/c.rs"));
    }

    #[test]
    fn test_git2_backend_before_first_commit() {
        let (dir, repo) = setup_test_repo();
        stage_files(&repo, &[("a.go", "package main\n"), ("b.log", "noise\n")]);

        let git = Git2Client::new(dir.path()).unwrap();
        check_backend_round_trip(&git);
    }

    #[test]
    fn test_git2_restage_of_deleted_file_stages_deletion() {
        let (dir, repo) = setup_test_repo();
        commit_files(&repo, &[("gone.txt", "bye\n"), ("kept.txt", "hi\n")]);
        let mut index = repo.index().unwrap();
        index.read(true).unwrap();
        index.remove_path(Path::new("gone.txt")).unwrap();
        index.write().unwrap();
        fs::remove_file(dir.path().join("gone.txt")).unwrap();

        let git = Git2Client::new(dir.path()).unwrap();
        assert_eq!(staged_set(&git), set(&["gone.txt"]));

        let unstaged = Stage::new(&git).unstage(vec!["gone.txt".to_string()]).unwrap();
        assert!(staged_set(&git).is_empty());
        unstaged.restore().unwrap();
        assert_eq!(staged_set(&git), set(&["gone.txt"]));
    }

    #[test]
    fn test_engine_against_real_repository() {
        let (dir, _repo) = repo_with_staged_changes();
        let manager = ConfigManager::new_at(dir.path());
        fs::create_dir_all(dir.path().join(".git-commit")).unwrap();
        fs::write(dir.path().join(".git-commit/ignore"), "# noise\n*.log\n").unwrap();

        let config = manager.load_config().unwrap();
        let git = GitCli::new(dir.path());
        let importer = FileImporter::new();
        let reporter = MemoryReporter::new();
        let engine = DiffEngine::new(manager.workflow_config(&config), &git, &importer, &reporter);

        let outcome = engine.run().unwrap();
        let WorkflowOutcome::Ready(prepared) = outcome else {
            panic!("expected a diff");
        };
        assert!(prepared.diff.contains("a.go"));
        assert!(!prepared.diff.contains("b.log"));
        assert_eq!(prepared.ignored, vec!["b.log".to_string()]);
        assert!(prepared.restore_error.is_none());
        assert!(reporter.contains(Level::Info, "  + b.log"));

        assert_eq!(staged_set(&git), set(&["a.go", "b.log"]));
    }

    #[test]
    fn test_engine_reports_no_changes_when_everything_is_ignored() {
        let (dir, _repo) = repo_with_staged_changes();
        let git = Git2Client::new(dir.path()).unwrap();
        let importer = StaticImporter::new(["*.log", "*.go"]);
        let reporter = MemoryReporter::new();
        let config = WorkflowConfig {
            ignore_file: dir.path().join("unused"),
        };

        let outcome = DiffEngine::new(config, &git, &importer, &reporter).run().unwrap();
        assert!(matches!(outcome, WorkflowOutcome::NoChanges { .. }));
        assert_eq!(staged_set(&git), set(&["a.go", "b.log"]));
    }

    /// Runs `check` once per backend, each time on a freshly built repository.
    fn for_each_backend(
        setup: fn() -> (TempDir, Repository),
        check: impl Fn(&dyn GitClient, &Repository),
    ) {
        let (dir, repo) = setup();
        check(&GitCli::new(dir.path()), &repo);

        let (dir, repo) = setup();
        check(&Git2Client::new(dir.path()).unwrap(), &repo);
    }

    fn index_blob(repo: &Repository, path: &str) -> Option<Oid> {
        let mut index = repo.index().unwrap();
        index.read(true).unwrap();
        index.get_path(Path::new(path), 0).map(|entry| entry.id)
    }

    fn unstage_path(repo: &Repository, path: &str) {
        let mut index = repo.index().unwrap();
        index.read(true).unwrap();
        index.remove_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    fn run_ignoring_logs(git: &dyn GitClient) -> WorkflowOutcome {
        let importer = StaticImporter::new(["*.log"]);
        let reporter = MemoryReporter::new();
        let config = WorkflowConfig {
            ignore_file: PathBuf::from("unused"),
        };
        DiffEngine::new(config, git, &importer, &reporter).run().unwrap()
    }

    /// `keep.log` is deleted from the index (`git rm --cached`) but still on
    /// disk, next to a staged edit of `a.go`.
    fn repo_with_staged_deletion() -> (TempDir, Repository) {
        let (dir, repo) = setup_test_repo();
        commit_files(&repo, &[("a.go", "package main\n"), ("keep.log", "log\n")]);
        stage_files(&repo, &[("a.go", "package main\n\nfunc main() {}\n")]);
        unstage_path(&repo, "keep.log");
        (dir, repo)
    }

    /// `keep.log` has one staged line and one more line only in the working
    /// tree.
    fn repo_with_partially_staged_file() -> (TempDir, Repository) {
        let (dir, repo) = setup_test_repo();
        commit_files(&repo, &[("a.go", "package main\n"), ("keep.log", "base\n")]);
        stage_files(
            &repo,
            &[("a.go", "package main\n// edit\n"), ("keep.log", "base\nstaged\n")],
        );
        write_file(&repo, "keep.log", "base\nstaged\nunstaged wip\n");
        (dir, repo)
    }

    /// `old.log` renamed to `new.log` with identical content.
    fn repo_with_staged_rename() -> (TempDir, Repository) {
        let (dir, repo) = setup_test_repo();
        let content = "same content\nacross the rename\n";
        commit_files(&repo, &[("a.go", "package main\n"), ("old.log", content)]);
        unstage_path(&repo, "old.log");
        fs::remove_file(dir.path().join("old.log")).unwrap();
        stage_files(&repo, &[("new.log", content), ("a.go", "package main\n// edit\n")]);
        (dir, repo)
    }

    #[test]
    fn test_staged_deletion_survives_a_run() {
        for_each_backend(repo_with_staged_deletion, |git, repo| {
            assert_eq!(staged_set(git), set(&["a.go", "keep.log"]));
            assert_eq!(index_blob(repo, "keep.log"), None);

            let WorkflowOutcome::Ready(prepared) = run_ignoring_logs(git) else {
                panic!("expected a diff");
            };
            assert!(!prepared.diff.contains("keep.log"));
            assert!(prepared.restore_error.is_none());

            assert_eq!(staged_set(git), set(&["a.go", "keep.log"]));
            assert_eq!(index_blob(repo, "keep.log"), None);
            assert!(repo.workdir().unwrap().join("keep.log").exists());
        });
    }

    #[test]
    fn test_partially_staged_file_keeps_its_staged_content() {
        for_each_backend(repo_with_partially_staged_file, |git, repo| {
            let staged_before = index_blob(repo, "keep.log").unwrap();

            let WorkflowOutcome::Ready(prepared) = run_ignoring_logs(git) else {
                panic!("expected a diff");
            };
            assert!(!prepared.diff.contains("keep.log"));

            let staged_after = index_blob(repo, "keep.log").unwrap();
            assert_eq!(staged_after, staged_before);
            assert_eq!(
                repo.find_blob(staged_after).unwrap().content(),
                b"base\nstaged\n"
            );
            assert_eq!(
                fs::read_to_string(repo.workdir().unwrap().join("keep.log")).unwrap(),
                "base\nstaged\nunstaged wip\n"
            );
        });
    }

    #[test]
    fn test_staged_rename_lists_both_paths() {
        for_each_backend(repo_with_staged_rename, |git, repo| {
            assert_eq!(staged_set(git), set(&["a.go", "new.log", "old.log"]));

            let WorkflowOutcome::Ready(prepared) = run_ignoring_logs(git) else {
                panic!("expected a diff");
            };
            assert!(!prepared.diff.contains(".log"));
            assert_eq!(prepared.ignored, vec!["new.log".to_string(), "old.log".to_string()]);

            assert_eq!(staged_set(git), set(&["a.go", "new.log", "old.log"]));
            assert_eq!(index_blob(repo, "old.log"), None);
            assert!(index_blob(repo, "new.log").is_some());
        });
    }
}
