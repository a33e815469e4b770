//! Host storage listing.

use std::sync::Arc;

use crate::command::{CommandError, CommandRunner};

/// Listing command used when none is configured.
pub fn default_command() -> &'static str {
    if cfg!(windows) {
        "Get-Volume | Format-Table -AutoSize"
    } else {
        "df -h"
    }
}

/// Produces the raw, human-readable storage table of the host.
#[derive(Clone)]
pub struct StorageInfoProvider {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl StorageInfoProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
        }
    }

    pub async fn listing(&self) -> Result<String, CommandError> {
        let stdout = self.runner.stdout(&self.command).await?;
        Ok(stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;

    #[tokio::test]
    async fn listing_is_trimmed() {
        let runner =
            ScriptedRunner::default().with("df -h", "\nFilesystem Size\n/dev/sda1 50G\n\n");
        let provider = StorageInfoProvider::new(Arc::new(runner), "df -h");
        assert_eq!(
            provider.listing().await.unwrap(),
            "Filesystem Size\n/dev/sda1 50G"
        );
    }

    #[tokio::test]
    async fn listing_propagates_failure() {
        let runner = ScriptedRunner::default().with_failure("df -h", 2, "boom");
        let provider = StorageInfoProvider::new(Arc::new(runner), "df -h");
        assert!(provider.listing().await.is_err());
    }
}
