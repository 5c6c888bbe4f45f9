//! Updates fanned out to observers (SSE clients, notifiers).

use serde::{Deserialize, Serialize};

use crate::advisory::Advisory;
use crate::device_state::DeviceState;
use crate::id::DeviceId;

/// Something observers should hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Update {
    /// A device snapshot changed (merge or optimistic command update).
    DeviceState(DeviceState),
    /// The advisory job produced a notification.
    Advisory(Advisory),
}

impl Update {
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceState(state) => &state.device_id,
            Self::Advisory(advisory) => &advisory.device_id,
        }
    }
}
