//! Subprocess capability used by the storage and disk-usage providers.

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {}: {stderr}", describe_exit(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command line and capture its output.
    async fn run(&self, command: &str) -> Result<CommandOutput, CommandError>;

    /// Run a command and return stdout, failing on a non-zero exit.
    async fn stdout(&self, command: &str) -> Result<String, CommandError> {
        let output = self.run(command).await?;
        if !output.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !output.stderr.trim().is_empty() {
            warn!("`{}` wrote to stderr: {}", command, output.stderr.trim());
        }
        Ok(output.stdout)
    }
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn command(line: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("powershell");
            cmd.args(["-NoProfile", "-Command", line]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", line]);
            cmd
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        debug!("Executing `{}`", command);
        let output = Self::command(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}
