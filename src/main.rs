//! Turns what is staged into a prompt for writing the commit message.
//!
//! Files matched by `.git-commit/ignore` are taken off the stage while the
//! diff is captured and put back afterwards, whatever happens in between.
//! The diff is wrapped in `<diff>` tags, followed by the prompt, and copied
//! to the clipboard (or printed with `--generate-prompt`).

use clap::{CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use git_commit_prompt::builders::delivery::{ClipboardSink, Deliver, StdoutSink};
use git_commit_prompt::builders::reporter::{Reporter, TracingReporter};
use git_commit_prompt::core::engine::WorkflowError;
use git_commit_prompt::utils::{self, Project, RunStatus};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for "nothing staged". Errors use `FAILURE_EXIT`.
const NO_CHANGES_EXIT: u8 = 1;
const FAILURE_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "git-commit-prompt", version)]
#[command(about = "Copy the staged diff, wrapped in a commit-message prompt, to the clipboard")]
struct Cli {
    /// Custom prompt from .git-commit/custom-instructions/<PROMPT>.md
    #[arg(value_name = "PROMPT")]
    prompt: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the prompt instead of copying it to the clipboard
    #[arg(short = 'p', long = "generate-prompt")]
    generate_prompt: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("GIT_COMMIT_PROMPT_LOG").unwrap_or_else(|_| default.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    // Loaded before parsing so `--help` can list the project's prompts.
    let project = Project::discover();

    let matches = Cli::command()
        .after_help(utils::help_footer(project.as_ref().ok()))
        .get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let project = match project {
        Ok(project) => project,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return ExitCode::from(FAILURE_EXIT);
        }
    };

    init_tracing(cli.verbose || project.config().verbose);
    let reporter = TracingReporter::new();

    let sink: Box<dyn Deliver> = if cli.generate_prompt {
        Box::new(StdoutSink)
    } else {
        Box::new(ClipboardSink::new(project.config().clipboard_command.clone()))
    };

    match utils::generate(&project, cli.prompt.as_deref(), sink.as_ref(), &reporter) {
        Ok(RunStatus::Delivered) => ExitCode::SUCCESS,
        Ok(RunStatus::NoChanges) => ExitCode::from(NO_CHANGES_EXIT),
        Err(e) => {
            // Workflow failures were already reported step by step.
            if e.downcast_ref::<WorkflowError>().is_none() {
                reporter.error(&format!("{e:#}"));
            }
            ExitCode::from(FAILURE_EXIT)
        }
    }
}
