//! Transport addresses.
//!
//! Inbound messages arrive on `<namespace>/device/<device_id>/<kind>`;
//! commands leave on `<namespace>/device/<device_id>/command`.

use std::fmt;

use crate::error::MalformedInputError;
use crate::id::DeviceId;

/// Second segment of every device address.
pub const DEVICE_SEGMENT: &str = "device";

/// Last segment of the outbound command address.
pub const COMMAND_SEGMENT: &str = "command";

/// What an inbound message carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Telemetry,
    Status,
    State,
    /// Anything else; routed, then rejected by the state cache.
    Other(String),
}

impl MessageKind {
    /// Inbound kinds the hub subscribes to.
    pub const SUBSCRIBED: [Self; 3] = [Self::Telemetry, Self::Status, Self::State];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Status => "status",
            Self::State => "state",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        match value {
            "telemetry" => Self::Telemetry,
            "status" => Self::Status,
            "state" => Self::State,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed inbound address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub device_id: DeviceId,
    pub kind: MessageKind,
}

impl Topic {
    /// Parse an inbound address against the configured namespace.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError::Topic`] unless the address has exactly
    /// four segments, starts with `namespace/device/`, and carries a valid
    /// device id.
    pub fn parse(namespace: &str, topic: &str) -> Result<Self, MalformedInputError> {
        let malformed = || MalformedInputError::Topic {
            topic: topic.to_string(),
        };
        let mut segments = topic.split('/');
        let (Some(ns), Some(device), Some(device_id), Some(kind), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed());
        };
        if ns != namespace || device != DEVICE_SEGMENT || kind.is_empty() {
            return Err(malformed());
        }
        let device_id = DeviceId::new(device_id).map_err(|_| malformed())?;
        Ok(Self {
            device_id,
            kind: MessageKind::from(kind),
        })
    }
}

/// Address a command for `device_id` is published on.
#[must_use]
pub fn command_topic(namespace: &str, device_id: &DeviceId) -> String {
    format!("{namespace}/{DEVICE_SEGMENT}/{device_id}/{COMMAND_SEGMENT}")
}

/// Wildcard filters covering every subscribed inbound kind.
#[must_use]
pub fn subscription_filters(namespace: &str) -> Vec<String> {
    MessageKind::SUBSCRIBED
        .iter()
        .map(|kind| format!("{namespace}/{DEVICE_SEGMENT}/+/{kind}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_telemetry_topic() {
        let topic = Topic::parse("smartgarden", "smartgarden/device/ESP32_GARDEN_001/telemetry").unwrap();
        assert_eq!(topic.device_id.as_str(), "ESP32_GARDEN_001");
        assert_eq!(topic.kind, MessageKind::Telemetry);
    }

    #[test]
    fn should_keep_unknown_kind_as_other() {
        let topic = Topic::parse("smartgarden", "smartgarden/device/g1/firmware").unwrap();
        assert_eq!(topic.kind, MessageKind::Other("firmware".to_string()));
    }

    #[test]
    fn should_reject_topic_with_fewer_than_four_segments() {
        assert!(Topic::parse("smartgarden", "smartgarden/device/g1").is_err());
        assert!(Topic::parse("smartgarden", "smartgarden").is_err());
        assert!(Topic::parse("smartgarden", "").is_err());
    }

    #[test]
    fn should_reject_topic_with_extra_segments() {
        assert!(Topic::parse("smartgarden", "smartgarden/device/g1/state/extra").is_err());
    }

    #[test]
    fn should_reject_foreign_namespace_or_segment() {
        assert!(Topic::parse("smartgarden", "othergarden/device/g1/state").is_err());
        assert!(Topic::parse("smartgarden", "smartgarden/sensor/g1/state").is_err());
    }

    #[test]
    fn should_reject_empty_device_id_or_kind() {
        assert!(Topic::parse("smartgarden", "smartgarden/device//state").is_err());
        assert!(Topic::parse("smartgarden", "smartgarden/device/g1/").is_err());
    }

    #[test]
    fn should_format_command_topic() {
        let id = DeviceId::new("g1").unwrap();
        assert_eq!(command_topic("smartgarden", &id), "smartgarden/device/g1/command");
    }

    #[test]
    fn should_build_wildcard_subscriptions() {
        assert_eq!(
            subscription_filters("ns"),
            vec![
                "ns/device/+/telemetry".to_string(),
                "ns/device/+/status".to_string(),
                "ns/device/+/state".to_string(),
            ]
        );
    }
}
