//! Threshold rules driving automatic watering.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GardenHubError, ValidationError};
use crate::id::DeviceId;

/// Per-device watering rule: pump when the soil is drier than
/// `min_soil_moisture`, for at most `max_pump_duration_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdRule {
    pub device_id: DeviceId,
    pub min_soil_moisture: f64,
    pub max_pump_duration_seconds: u64,
    #[serde(alias = "isActive")]
    pub active: bool,
}

impl ThresholdRule {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] when the moisture threshold is
    /// outside `0..=100` or the pump duration is zero.
    pub fn validate(&self) -> Result<(), GardenHubError> {
        if !(0.0..=100.0).contains(&self.min_soil_moisture) {
            return Err(ValidationError::MoistureOutOfRange(self.min_soil_moisture).into());
        }
        if self.max_pump_duration_seconds == 0 {
            return Err(ValidationError::ZeroPumpDuration.into());
        }
        Ok(())
    }

    /// Whether a reading is below the threshold.
    #[must_use]
    pub fn is_dry(&self, soil_moisture: f64) -> bool {
        soil_moisture < self.min_soil_moisture
    }

    #[must_use]
    pub fn pump_duration(&self) -> Duration {
        Duration::from_secs(self.max_pump_duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(min: f64, secs: u64) -> ThresholdRule {
        ThresholdRule {
            device_id: DeviceId::new("g1").unwrap(),
            min_soil_moisture: min,
            max_pump_duration_seconds: secs,
            active: true,
        }
    }

    #[test]
    fn should_accept_valid_rule() {
        assert!(rule(30.0, 15).validate().is_ok());
        assert!(rule(0.0, 1).validate().is_ok());
        assert!(rule(100.0, 1).validate().is_ok());
    }

    #[test]
    fn should_reject_out_of_range_moisture() {
        assert!(matches!(
            rule(120.0, 15).validate(),
            Err(GardenHubError::Validation(ValidationError::MoistureOutOfRange(_)))
        ));
        assert!(rule(f64::NAN, 15).validate().is_err());
        assert!(rule(-1.0, 15).validate().is_err());
    }

    #[test]
    fn should_reject_zero_duration() {
        assert!(matches!(
            rule(30.0, 0).validate(),
            Err(GardenHubError::Validation(ValidationError::ZeroPumpDuration))
        ));
    }

    #[test]
    fn should_compare_strictly_below_threshold() {
        let rule = rule(30.0, 15);
        assert!(rule.is_dry(29.9));
        assert!(!rule.is_dry(30.0));
        assert_eq!(rule.pump_duration(), Duration::from_secs(15));
    }

    #[test]
    fn should_accept_legacy_is_active_key() {
        let rule: ThresholdRule = serde_json::from_str(
            r#"{"deviceId":"g1","minSoilMoisture":30,"maxPumpDurationSeconds":15,"isActive":false}"#,
        )
        .unwrap();
        assert!(!rule.active);
    }
}
