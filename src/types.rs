//! Data structures used throughout the notifier.
//!
//! Everything here is a value object: an event is decoded from one stream
//! record, turned into a [`Notification`] and dropped once it has been
//! handed to the webhook.  Nothing is persisted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Accent color used for events that match no dedicated channel (`#9B59B6`).
pub const ACCENT_COLOR: u32 = 0x9B59B6;

/// One event from the container runtime's live event stream.
///
/// Field names follow the Docker Engine wire format so a raw record can be
/// decoded directly.  `Type` and `Action` are mandatory; a record lacking
/// either is rejected at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    /// Resource category: `container`, `image`, `network`, `volume`, ...
    #[serde(rename = "Type")]
    pub kind: String,
    /// Verb describing the change (`start`, `die`, `build`, ...).
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Actor", default)]
    pub actor: Actor,
    #[serde(default)]
    pub scope: String,
    /// Seconds since the Unix epoch.
    #[serde(rename = "time", default)]
    pub epoch_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Attributes", default)]
    pub attributes: HashMap<String, String>,
}

impl RuntimeEvent {
    /// Decode a raw stream record.
    pub fn decode(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    /// Look up an actor attribute, `""` when absent.
    pub fn attribute(&self, key: &str) -> &str {
        self.actor
            .attributes
            .get(key)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Routing category that decides how the webhook renders a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    /// Generic log entry rendered with the given accent color.
    Log { color: u32 },
    Error,
}

/// Channel a runtime event is routed to. Classification never yields an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Success,
    Info,
    Log { color: u32 },
}

impl From<EventSeverity> for Severity {
    fn from(severity: EventSeverity) -> Self {
        match severity {
            EventSeverity::Success => Severity::Success,
            EventSeverity::Info => Severity::Info,
            EventSeverity::Log { color } => Severity::Log { color },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    /// Rendered side by side with neighbouring inline fields.
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub fields: Vec<Field>,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }
}

/// Disk usage per resource category as reported by `docker system df`.
///
/// Each entry is either `"Size: <size>, Reclaimable: <reclaimable>"` or
/// [`UsageSummary::MISSING`] when its line could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    pub images: String,
    pub containers: String,
    pub volumes: String,
    pub cache: String,
}

impl UsageSummary {
    pub const MISSING: &'static str = "N/A";
}

/// Composite status digest built once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyReport {
    pub storage: String,
    pub running_containers: u64,
    pub stopped_containers: u64,
    pub usage: UsageSummary,
}

impl HourlyReport {
    pub const TITLE: &'static str = "Docker Hourly Report";

    pub fn into_notification(self) -> Notification {
        let fields = vec![
            Field::new("Storage Usage", self.storage, false),
            Field::new(
                "Running Containers",
                self.running_containers.to_string(),
                true,
            ),
            Field::new(
                "Unused Containers",
                self.stopped_containers.to_string(),
                true,
            ),
            Field::new("Images", self.usage.images, false),
            Field::new("Containers", self.usage.containers, false),
            Field::new("Volumes", self.usage.volumes, false),
            Field::new("Build Cache", self.usage.cache, false),
        ];
        Notification::new(Self::TITLE, "Current Docker system status").with_fields(fields)
    }
}
