//! Device: a registry record describing a field controller.
//!
//! The registry is the authoritative source for a device's control mode; the
//! cached [`DeviceState`](crate::device_state::DeviceState) only mirrors what
//! the device last reported.

use serde::{Deserialize, Serialize};

use crate::device_state::ControlMode;
use crate::error::{GardenHubError, ValidationError};
use crate::id::DeviceId;

/// A registered garden controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: DeviceId,
    pub name: String,
    pub control_mode: ControlMode,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), GardenHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    device_id: Option<DeviceId>,
    name: Option<String>,
    control_mode: Option<ControlMode>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn control_mode(mut self, control_mode: ControlMode) -> Self {
        self.control_mode = Some(control_mode);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The control mode defaults to [`ControlMode::Manual`].
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] if the device id is missing or
    /// the name is missing or empty.
    pub fn build(self) -> Result<Device, GardenHubError> {
        let device_id = self.device_id.ok_or(ValidationError::EmptyDeviceId)?;
        let device = Device {
            device_id,
            name: self.name.unwrap_or_default(),
            control_mode: self.control_mode.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}
