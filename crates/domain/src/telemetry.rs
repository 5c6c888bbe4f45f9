//! A sensor sample handed to the history sink.

use serde::{Deserialize, Serialize};

use crate::device_state::SensorSnapshot;
use crate::id::DeviceId;
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub device_id: DeviceId,
    pub sensors: SensorSnapshot,
    pub recorded_at: Timestamp,
}
