//! Advisory decisions: what the external decision service is asked, what it
//! may answer, and the notification the hub publishes afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::CommandRequest;
use crate::device_state::{ControlMode, DeviceState, PumpState};
use crate::id::{AdvisoryId, DeviceId};
use crate::time::{Timestamp, now};

/// Tool name the decision service uses to switch an actuator.
pub const CONTROL_DEVICE_TOOL: &str = "controlDevice";

/// Actuator name for the water pump in `controlDevice` arguments.
pub const PUMP_ACTUATOR: &str = "PUMP";

/// Forecast placeholder when no weather source is available.
pub const UNKNOWN_FORECAST: &str = "unknown";

/// Weather snapshot passed to the decision service.
///
/// `forecast` is a free-form summary; the structured fields describe the
/// current conditions and the next three hours when the source knows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherContext {
    pub location: String,
    pub forecast: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Degrees Celsius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity, percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub rain_expected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_temperature: Option<f64>,
    /// Rain expected over the next three hours, millimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_amount: Option<f64>,
}

impl WeatherContext {
    /// A context for `location` with no known forecast.
    #[must_use]
    pub fn unknown(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            forecast: UNKNOWN_FORECAST.to_string(),
            description: None,
            temperature: None,
            humidity: None,
            rain_expected: false,
            next_description: None,
            next_temperature: None,
            rain_amount: None,
        }
    }
}

/// Input to one advisory decision.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRequest {
    pub prompt: String,
    pub device_id: DeviceId,
    /// Current cached view of the device.
    pub garden: DeviceState,
    pub weather: WeatherContext,
    /// `MANUAL` devices are asked for advice only.
    pub mode: ControlMode,
}

/// A single tool invocation proposed by the decision service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// What the decision service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisorResponse {
    Text(String),
    ToolCall(ToolCall),
}

/// Arguments of the `controlDevice` tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDeviceArgs {
    pub device_uid: String,
    pub device_name: String,
    pub turn_on: bool,
    #[serde(default)]
    pub duration_minutes: Option<u64>,
}

/// Why a tool call cannot be turned into a command.
#[derive(Debug, thiserror::Error)]
pub enum UnsupportedTool {
    #[error("unknown tool {0:?}")]
    UnknownTool(String),

    #[error("invalid controlDevice arguments")]
    InvalidArguments(#[source] serde_json::Error),

    #[error("tool call targets device {0:?}")]
    ForeignDevice(String),

    #[error("unknown actuator {0:?}")]
    UnknownActuator(String),
}

/// A command derived from a tool call, with a human-readable summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
    pub command: CommandRequest,
    pub summary: String,
}

impl ToolCall {
    /// Turn the call into a command for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedTool`] for unknown tools, malformed arguments,
    /// calls naming another device, or actuators other than the pump.
    pub fn plan(&self, device_id: &DeviceId) -> Result<PlannedAction, UnsupportedTool> {
        if self.name != CONTROL_DEVICE_TOOL {
            return Err(UnsupportedTool::UnknownTool(self.name.clone()));
        }
        let args: ControlDeviceArgs = serde_json::from_value(Value::Object(self.arguments.clone()))
            .map_err(UnsupportedTool::InvalidArguments)?;
        if args.device_uid != device_id.as_str() {
            return Err(UnsupportedTool::ForeignDevice(args.device_uid));
        }
        if !args.device_name.eq_ignore_ascii_case(PUMP_ACTUATOR) {
            return Err(UnsupportedTool::UnknownActuator(args.device_name));
        }

        let state = if args.turn_on { PumpState::On } else { PumpState::Off };
        let time = args.duration_minutes.map(|minutes| minutes.saturating_mul(60));
        let summary = match args.duration_minutes {
            Some(minutes) if args.turn_on => format!("turn the pump {state} for {minutes} min"),
            _ => format!("turn the pump {state}"),
        };
        Ok(PlannedAction {
            command: CommandRequest::control_pump(device_id.clone(), state, time),
            summary,
        })
    }
}

/// Notification published to observers after an advisory tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub id: AdvisoryId,
    pub device_id: DeviceId,
    pub mode: ControlMode,
    pub message: String,
    pub created_at: Timestamp,
}

impl Advisory {
    #[must_use]
    pub fn new(device_id: DeviceId, mode: ControlMode, message: impl Into<String>) -> Self {
        Self {
            id: AdvisoryId::new(),
            device_id,
            mode,
            message: message.into(),
            created_at: now(),
        }
    }
}
