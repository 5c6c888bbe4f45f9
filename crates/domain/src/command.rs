//! Outbound device commands.
//!
//! On the wire a command is `{"action": "...", "payload": {...}}`. The hub
//! understands two actions well enough to predict their effect; everything
//! else is forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::device_state::{ControlMode, PumpState};
use crate::error::ValidationError;
use crate::id::DeviceId;

/// Switch the water pump: `payload.state` is `ON`/`OFF`, `payload.time` is an
/// optional run limit in seconds.
pub const CONTROL_PUMP: &str = "CONTROL_PUMP";

/// Switch the control mode: `payload.mode` is `AUTO`/`MANUAL`.
pub const SET_MODE: &str = "SET_MODE";

/// A command addressed to one device. Consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub device_id: DeviceId,
    pub action: String,
    pub payload: Map<String, Value>,
}

/// The hub's understanding of a [`CommandRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    ControlPump { state: PumpState, time: Option<u64> },
    SetMode { mode: ControlMode },
    /// Not recognised; no local effect.
    Other,
}

/// Wire form of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub action: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl CommandRequest {
    /// Build a request with an arbitrary action tag.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAction`] when `action` is blank.
    pub fn new(
        device_id: DeviceId,
        action: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let action = action.into();
        if action.trim().is_empty() {
            return Err(ValidationError::EmptyAction);
        }
        Ok(Self {
            device_id,
            action,
            payload,
        })
    }

    /// `CONTROL_PUMP` with an optional run limit in seconds.
    #[must_use]
    pub fn control_pump(device_id: DeviceId, state: PumpState, time: Option<u64>) -> Self {
        let mut payload = Map::new();
        payload.insert("state".to_string(), Value::from(state.as_str()));
        if let Some(time) = time {
            payload.insert("time".to_string(), Value::from(time));
        }
        Self {
            device_id,
            action: CONTROL_PUMP.to_string(),
            payload,
        }
    }

    /// `SET_MODE`.
    #[must_use]
    pub fn set_mode(device_id: DeviceId, mode: ControlMode) -> Self {
        let mut payload = Map::new();
        payload.insert("mode".to_string(), Value::from(mode.as_str()));
        Self {
            device_id,
            action: SET_MODE.to_string(),
            payload,
        }
    }

    /// Interpret the action tag and its payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a recognised action is missing its
    /// required field or carries a value outside its vocabulary.
    pub fn interpret(&self) -> Result<CommandAction, ValidationError> {
        match self.action.as_str() {
            CONTROL_PUMP => {
                let state = required_str(&self.payload, CONTROL_PUMP, "state")?
                    .parse::<PumpState>()?;
                let time = match self.payload.get("time") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(
                        value
                            .as_u64()
                            .ok_or_else(|| ValidationError::InvalidPumpTime(value.to_string()))?,
                    ),
                };
                Ok(CommandAction::ControlPump { state, time })
            }
            SET_MODE => {
                let mode = required_str(&self.payload, SET_MODE, "mode")?.parse::<ControlMode>()?;
                Ok(CommandAction::SetMode { mode })
            }
            _ => Ok(CommandAction::Other),
        }
    }

    /// Wire form of this command.
    #[must_use]
    pub fn envelope(&self) -> CommandEnvelope {
        CommandEnvelope {
            action: self.action.clone(),
            payload: self.payload.clone(),
        }
    }

    /// Encode the wire form as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if encoding fails.
    pub fn to_wire(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.envelope())
    }
}

fn required_str<'a>(
    payload: &'a Map<String, Value>,
    action: &'static str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match payload.get(field) {
        Some(Value::String(value)) => Ok(value),
        None | Some(Value::Null) => Err(ValidationError::MissingField { action, field }),
        Some(other) => Err(unexpected(action, other)),
    }
}

fn unexpected(action: &str, value: &Value) -> ValidationError {
    if action == SET_MODE {
        ValidationError::UnknownControlMode(value.to_string())
    } else {
        ValidationError::UnknownPumpState(value.to_string())
    }
}
