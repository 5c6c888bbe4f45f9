//! `DeviceState`: the cached, last-known view of one garden controller.
//!
//! A snapshot is only ever changed through the merge operations below, each
//! of which returns a fresh value so a failed merge can never leave a
//! half-applied snapshot behind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::CommandAction;
use crate::error::{MalformedInputError, ValidationError};
use crate::id::DeviceId;
use crate::patch::StatePatch;
use crate::time::{Timestamp, monotonic_after};

macro_rules! wire_enum {
    (
        $(#[doc = $doc:expr])*
        $name:ident, $err:ident, default = $default:ident,
        { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Wire representation (always uppercase).
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($wire) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(ValidationError::$err(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }
    };
}

wire_enum!(
    /// Whether the device is currently connected to the broker.
    Connectivity, UnknownConnectivity, default = Offline,
    { Online => "ONLINE", Offline => "OFFLINE" }
);

wire_enum!(
    /// Who is in charge of the actuators: the rules (`AUTO`) or a human (`MANUAL`).
    ControlMode, UnknownControlMode, default = Manual,
    { Auto => "AUTO", Manual => "MANUAL" }
);

wire_enum!(
    /// Water pump relay state.
    PumpState, UnknownPumpState, default = Off,
    { On => "ON", Off => "OFF" }
);

/// Latest sensor readings reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub temperature: f64,
    pub air_humidity: f64,
    pub light: f64,
    pub soil_moisture: f64,
}

/// Cached snapshot of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub device_id: DeviceId,
    pub status: Connectivity,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub last_seen: Option<Timestamp>,
    pub control_mode: ControlMode,
    pub pump_state: PumpState,
    pub sensors: SensorSnapshot,
}

/// How a `status` payload was understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// A recognised connectivity value.
    Known(Connectivity),
    /// A value that is not `ONLINE`/`OFFLINE`; connectivity is left as is.
    Unrecognised(String),
}

impl StatusReport {
    /// Interpret a `status` payload.
    ///
    /// The structured forms are a JSON object with a `status` string field or
    /// a JSON string. Anything else is taken verbatim as the raw status text.
    #[must_use]
    pub fn parse(payload: &[u8]) -> Self {
        let raw = match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) => match map.get("status") {
                Some(Value::String(status)) => status.clone(),
                _ => String::from_utf8_lossy(payload).into_owned(),
            },
            Ok(Value::String(status)) => status,
            _ => String::from_utf8_lossy(payload).into_owned(),
        };
        match raw.parse::<Connectivity>() {
            Ok(status) => Self::Known(status),
            Err(_) => Self::Unrecognised(raw.trim().to_string()),
        }
    }
}

impl DeviceState {
    /// The snapshot used for a device that has never been seen.
    #[must_use]
    pub fn offline(device_id: DeviceId) -> Self {
        Self {
            device_id,
            status: Connectivity::Offline,
            last_seen: None,
            control_mode: ControlMode::default(),
            pump_state: PumpState::default(),
            sensors: SensorSnapshot::default(),
        }
    }

    fn touched(&self, now: Timestamp) -> Self {
        let mut next = self.clone();
        next.last_seen = Some(monotonic_after(self.last_seen, now));
        next
    }

    /// Apply a `telemetry` payload: the nested `sensors` object replaces the
    /// sensor snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] when the payload is not a JSON object,
    /// has no `sensors` object, or holds ill-typed readings. `self` is not
    /// changed in that case.
    pub fn with_telemetry(&self, payload: &[u8], now: Timestamp) -> Result<Self, MalformedInputError> {
        let sensors = parse_sensors(payload)?;
        let mut next = self.touched(now);
        next.sensors = sensors;
        Ok(next)
    }

    /// Apply a parsed `status` report. Always refreshes `last_seen`.
    #[must_use]
    pub fn with_status(&self, report: &StatusReport, now: Timestamp) -> Self {
        let mut next = self.touched(now);
        if let StatusReport::Known(status) = report {
            next.status = *status;
        }
        next
    }

    /// Apply a field-level `state` patch. Fields absent from the patch are
    /// left untouched.
    #[must_use]
    pub fn with_state(&self, patch: StatePatch, now: Timestamp) -> Self {
        let mut next = self.touched(now);
        patch.status.apply_to(&mut next.status);
        patch.control_mode.apply_to(&mut next.control_mode);
        patch.pump_state.apply_to(&mut next.pump_state);
        patch.sensors.apply_to(&mut next.sensors);
        next
    }

    /// Fold the expected effect of an outbound command into the snapshot.
    ///
    /// Returns `None` when the action has no local effect.
    #[must_use]
    pub fn with_command(&self, action: &CommandAction) -> Option<Self> {
        let mut next = self.clone();
        match action {
            CommandAction::ControlPump { state, .. } => next.pump_state = *state,
            CommandAction::SetMode { mode } => next.control_mode = *mode,
            CommandAction::Other => return None,
        }
        Some(next)
    }

    /// Whether the last known pump state is `ON`.
    #[must_use]
    pub fn is_pumping(&self) -> bool {
        self.pump_state == PumpState::On
    }
}

fn parse_sensors(payload: &[u8]) -> Result<SensorSnapshot, MalformedInputError> {
    let value: Value = serde_json::from_slice(payload).map_err(|source| MalformedInputError::Json {
        kind: "telemetry",
        source,
    })?;
    let sensors = match value {
        Value::Object(mut map) => map.remove("sensors"),
        _ => None,
    };
    match sensors {
        Some(sensors @ Value::Object(_)) => {
            serde_json::from_value(sensors).map_err(|source| MalformedInputError::Json {
                kind: "telemetry",
                source,
            })
        }
        _ => Err(MalformedInputError::MissingField {
            kind: "telemetry",
            field: "sensors",
        }),
    }
}
