use anyhow::{Context, Result, bail};
use std::io::Write;
use std::process::{Command, Stdio};

/// Where the finished prompt goes.
pub trait Deliver {
    fn deliver(&self, text: &str) -> Result<()>;

    /// A short confirmation for the user once `deliver` succeeded.
    fn confirmation(&self) -> &'static str;
}

/// Pipes the text into a clipboard program such as `pbcopy` or `xclip`.
pub struct ClipboardSink {
    command: Vec<String>,
}

impl ClipboardSink {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Deliver for ClipboardSink {
    fn deliver(&self, text: &str) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("no clipboard command configured");
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start clipboard command `{program}`"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .with_context(|| format!("failed to write to `{program}`"))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{program}`"))?;
        if !output.status.success() {
            bail!(
                "`{program}` failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn confirmation(&self) -> &'static str {
        "Prompt with the staged diff copied to clipboard."
    }
}

/// Prints the text to stdout, for `--generate-prompt` and piping.
pub struct StdoutSink;

impl Deliver for StdoutSink {
    fn deliver(&self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}").context("failed to write prompt to stdout")?;
        stdout.flush().context("failed to flush stdout")
    }

    fn confirmation(&self) -> &'static str {
        "Prompt with the staged diff generated."
    }
}
