//! Discord webhook delivery.
//!
//! Each notification becomes a single embed. Discord rejects empty field
//! values and oversized text, so both are normalised while rendering.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Notifier, NotifyError};
use crate::types::{Notification, Severity};

const SUCCESS_COLOR: u32 = 0x2ECC71;
const INFO_COLOR: u32 = 0x3498DB;
const ERROR_COLOR: u32 = 0xE74C3C;

const MAX_TITLE: usize = 256;
const MAX_DESCRIPTION: usize = 4096;
const MAX_FIELD_NAME: usize = 256;
const MAX_FIELD_VALUE: usize = 1024;
const MAX_FIELDS: usize = 25;

/// Zero-width space; Discord refuses empty field values.
const BLANK: &str = "\u{200b}";

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
    production: bool,
}

impl DiscordNotifier {
    pub fn new(
        webhook_url: impl Into<String>,
        username: impl Into<String>,
        production: bool,
    ) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
            username: username.into(),
            production,
        }
    }

    fn color(severity: Severity) -> u32 {
        match severity {
            Severity::Success => SUCCESS_COLOR,
            Severity::Info => INFO_COLOR,
            Severity::Error => ERROR_COLOR,
            Severity::Log { color } => color,
        }
    }

    fn environment(&self) -> &'static str {
        if self.production {
            "production"
        } else {
            "development"
        }
    }

    fn build_payload(&self, severity: Severity, notification: &Notification) -> Value {
        let fields: Vec<Value> = notification
            .fields
            .iter()
            .take(MAX_FIELDS)
            .map(|field| {
                json!({
                    "name": non_blank(truncate(&field.name, MAX_FIELD_NAME)),
                    "value": non_blank(truncate(&field.value, MAX_FIELD_VALUE)),
                    "inline": field.inline,
                })
            })
            .collect();

        let mut embed = json!({
            "title": truncate(&notification.title, MAX_TITLE),
            "color": Self::color(severity),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "footer": { "text": format!("{} | {}", self.username, self.environment()) },
        });
        if !notification.description.is_empty() {
            embed["description"] = json!(truncate(&notification.description, MAX_DESCRIPTION));
        }
        if !fields.is_empty() {
            embed["fields"] = Value::Array(fields);
        }

        json!({
            "username": self.username,
            "embeds": [embed],
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(
        &self,
        severity: Severity,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        if !self.production {
            debug!("Sending {:?} notification: {}", severity, notification.title);
        }

        let payload = self.build_payload(severity, notification);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        Ok(())
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn non_blank(text: String) -> String {
    if text.trim().is_empty() {
        BLANK.to_string()
    } else {
        text
    }
}
