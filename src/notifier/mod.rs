//! Outbound messaging capability.
//!
//! Every send is fire-and-forget from the caller's point of view: the
//! convenience methods on [`Notifier`] log a failed delivery and return.
//! Nothing is retried and no error reaches the loops that produce messages.

use async_trait::async_trait;
use log::error;

mod discord;
pub use discord::DiscordNotifier;

use crate::types::{Field, Notification, Severity};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook rejected message with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message on the channel selected by `severity`.
    async fn deliver(
        &self,
        severity: Severity,
        notification: &Notification,
    ) -> Result<(), NotifyError>;

    /// Deliver and log on failure.
    async fn notify(&self, severity: Severity, notification: Notification) {
        if let Err(e) = self.deliver(severity, &notification).await {
            error!("Failed to send notification '{}': {}", notification.title, e);
        }
    }

    async fn success(&self, title: &str, description: &str, fields: Vec<Field>) {
        self.notify(
            Severity::Success,
            Notification::new(title, description).with_fields(fields),
        )
        .await
    }

    async fn info(&self, title: &str, description: &str, fields: Vec<Field>) {
        self.notify(
            Severity::Info,
            Notification::new(title, description).with_fields(fields),
        )
        .await
    }

    async fn error(&self, title: &str, message: &str) {
        self.notify(Severity::Error, Notification::new(title, message)).await
    }

    async fn log(&self, notification: Notification, color: u32) {
        self.notify(Severity::Log { color }, notification).await
    }
}
