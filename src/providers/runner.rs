use std::process::Stdio;

use log::debug;
use tokio::process::Command;

use crate::error::{GcbError, Result};

/// Captured result of an external command that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[cfg(test)]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[cfg(test)]
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Passes a successful output through, otherwise returns the external
    /// error text verbatim.
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success {
            return Ok(self);
        }

        let stderr = if self.stderr.trim().is_empty() {
            self.stdout
        } else {
            self.stderr
        };

        Err(GcbError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.trim_end().to_string(),
        })
    }

    pub fn into_stdout(self, command: &str) -> Result<String> {
        self.check(command).map(|output| output.stdout)
    }
}

/// Seam between the handlers and the external binaries they drive.
///
/// Every call is awaited to completion before the next one starts.
pub trait CommandRunner {
    /// Runs `program` to completion with stdout and stderr captured.
    async fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Runs `program` with the console attached, forwarding its output verbatim.
    ///
    /// Returns whether the process exited successfully.
    async fn attach(&self, program: &str, args: &[String]) -> Result<bool>;
}

/// Renders a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs real processes through `tokio::process`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn output(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running: {}", display_command(program, args));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn attach(&self, program: &str, args: &[String]) -> Result<bool> {
        debug!("Attaching: {}", display_command(program, args));

        // The child is killed when this handle goes out of scope, including
        // when the operator interrupts the stream.
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        tokio::select! {
            status = child.wait() => Ok(status?.success()),
            _ = tokio::signal::ctrl_c() => Err(GcbError::Interrupted),
        }
    }
}
