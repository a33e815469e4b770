//! Maps a runtime event to a routing severity and its field set.

use chrono::{DateTime, SecondsFormat};

use crate::types::{EventSeverity, Field, Notification, RuntimeEvent, ACCENT_COLOR};

/// Container actions that are worth a dedicated info message.
const CONTAINER_LIFECYCLE: [&str; 3] = ["start", "stop", "die"];

/// Classify an event. The first matching rule decides the severity.
pub fn classify(event: &RuntimeEvent) -> (EventSeverity, Vec<Field>) {
    let is_build = event.kind == "image" && event.action == "build";

    let mut fields = vec![
        Field::new("Type", event.kind.as_str(), true),
        Field::new("Action", event.action.as_str(), true),
        Field::new("Actor ID", event.actor.id.as_str(), false),
        Field::new("Container Image", event.attribute("image"), false),
        Field::new("Container Name", event.attribute("name"), false),
        Field::new("Scope", event.scope.as_str(), true),
        Field::new("Time", format_time(event.epoch_seconds), true),
    ];

    let severity = if is_build {
        let name = match event.attribute("name") {
            "" => "N/A",
            name => name,
        };
        fields.push(Field::new("Image Name", name, false));
        EventSeverity::Success
    } else if event.kind == "container" && CONTAINER_LIFECYCLE.contains(&event.action.as_str()) {
        EventSeverity::Info
    } else if matches!(event.kind.as_str(), "network" | "volume") {
        EventSeverity::Info
    } else {
        EventSeverity::Log { color: ACCENT_COLOR }
    };

    (severity, fields)
}

/// Build the full notification for an event.
pub fn notification_for(event: &RuntimeEvent) -> (EventSeverity, Notification) {
    let (severity, fields) = classify(event);
    let notification = Notification::new(
        format!("Docker Event: {} {}", event.kind, event.action),
        format!("Event details for {}", event.actor.id),
    )
    .with_fields(fields);
    (severity, notification)
}

/// ISO-8601 with millisecond precision, e.g. `2023-11-14T22:13:20.000Z`.
fn format_time(epoch_seconds: i64) -> String {
    epoch_seconds
        .checked_mul(1000)
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| epoch_seconds.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Actor;
    use std::collections::HashMap;

    fn event(kind: &str, action: &str, attributes: &[(&str, &str)]) -> RuntimeEvent {
        RuntimeEvent {
            kind: kind.into(),
            action: action.into(),
            actor: Actor {
                id: "f00dcafe".into(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            },
            scope: "local".into(),
            epoch_seconds: 1_700_000_000,
        }
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    const BASE_FIELDS: [&str; 7] = [
        "Type",
        "Action",
        "Actor ID",
        "Container Image",
        "Container Name",
        "Scope",
        "Time",
    ];

    #[test]
    fn image_build_is_success_with_image_name() {
        let (severity, fields) = classify(&event("image", "build", &[("name", "app:1.0")]));
        assert_eq!(severity, EventSeverity::Success);
        assert_eq!(fields.len(), 8);
        assert_eq!(&names(&fields)[..7], BASE_FIELDS);
        assert_eq!(fields[7].name, "Image Name");
        assert_eq!(fields[7].value, "app:1.0");
    }

    #[test]
    fn image_build_without_name_uses_placeholder() {
        let (_, fields) = classify(&event("image", "build", &[]));
        assert_eq!(fields[7].value, "N/A");

        let (_, fields) = classify(&event("image", "build", &[("name", "")]));
        assert_eq!(fields[7].value, "N/A");
    }

    #[test]
    fn container_lifecycle_is_info() {
        for action in ["start", "stop", "die"] {
            let (severity, fields) = classify(&event(
                "container",
                action,
                &[("image", "nginx"), ("name", "web")],
            ));
            assert_eq!(severity, EventSeverity::Info, "action {action}");
            assert_eq!(names(&fields), BASE_FIELDS);
            assert_eq!(fields[3].value, "nginx");
            assert_eq!(fields[4].value, "web");
        }
    }

    #[test]
    fn network_and_volume_are_info() {
        for kind in ["network", "volume"] {
            for action in ["create", "destroy", "connect", "build"] {
                let (severity, _) = classify(&event(kind, action, &[]));
                assert_eq!(severity, EventSeverity::Info, "{kind} {action}");
            }
        }
    }

    #[test]
    fn everything_else_is_log_with_accent() {
        let cases = [
            ("container", "exec_start"),
            ("container", "kill"),
            ("image", "pull"),
            ("image", "delete"),
            ("plugin", "enable"),
            ("daemon", "reload"),
        ];
        for (kind, action) in cases {
            let (severity, fields) = classify(&event(kind, action, &[]));
            assert_eq!(severity, EventSeverity::Log { color: 10181046 }, "{kind} {action}");
            assert_eq!(names(&fields), BASE_FIELDS);
        }
    }

    #[test]
    fn missing_attributes_render_empty() {
        let (_, fields) = classify(&event("container", "start", &[]));
        assert_eq!(fields[3].value, "");
        assert_eq!(fields[4].value, "");
    }

    #[test]
    fn time_is_iso_millis() {
        let (_, fields) = classify(&event("container", "start", &[]));
        assert_eq!(fields[6].value, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn classify_is_pure() {
        let e = event("image", "build", &[("name", "x")]);
        assert_eq!(classify(&e), classify(&e));
    }

    #[test]
    fn notification_title_and_description() {
        let (_, n) = notification_for(&event("volume", "mount", &[]));
        assert_eq!(n.title, "Docker Event: volume mount");
        assert_eq!(n.description, "Event details for f00dcafe");
    }
}
