//! Field-presence-aware partial updates.
//!
//! A `state` message only carries the fields the device wants to change, and
//! a field explicitly set to `null` means something different from a field
//! that is missing. [`Patch`] keeps those three cases apart.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::device_state::{Connectivity, ControlMode, PumpState, SensorSnapshot};
use crate::error::MalformedInputError;

/// One optional field of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// The key was not in the document: leave the target alone.
    #[default]
    Absent,
    /// The key was present with `null`: reset the target to its default.
    Null,
    /// The key was present with a value: overwrite the target.
    Value(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: Default> Patch<T> {
    /// Write this patch into `target`.
    pub fn apply_to(self, target: &mut T) {
        match self {
            Self::Absent => {}
            Self::Null => *target = T::default(),
            Self::Value(value) => *target = value,
        }
    }
}

// Only called by serde when the key is present; `#[serde(default)]` covers
// the absent case.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| value.map_or(Self::Null, Self::Value))
    }
}

/// Body of a `state` message.
///
/// Keys are accepted in camelCase or snake_case. Unknown keys (including
/// `deviceId` and `lastSeen`, which the hub owns) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default)]
    pub status: Patch<Connectivity>,
    #[serde(default, alias = "control_mode")]
    pub control_mode: Patch<ControlMode>,
    #[serde(default, alias = "pump_state")]
    pub pump_state: Patch<PumpState>,
    #[serde(default)]
    pub sensors: Patch<SensorSnapshot>,
}

impl StatePatch {
    /// Parse a `state` payload.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] when the payload is not a JSON object
    /// or a known field has the wrong type.
    pub fn from_slice(payload: &[u8]) -> Result<Self, MalformedInputError> {
        let json = |source| MalformedInputError::Json {
            kind: "state",
            source,
        };
        let value: Value = serde_json::from_slice(payload).map_err(json)?;
        if !value.is_object() {
            return Err(MalformedInputError::NotAnObject { kind: "state" });
        }
        serde_json::from_value(value).map_err(json)
    }

    /// Whether the patch changes nothing besides `last_seen`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_absent()
            && self.control_mode.is_absent()
            && self.pump_state.is_absent()
            && self.sensors.is_absent()
    }
}
