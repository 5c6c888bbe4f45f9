//! Storage ports: the device registry and the threshold rule store.

use std::future::Future;

use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::threshold::ThresholdRule;

/// Registry of known devices. Authoritative for each device's control mode.
pub trait DeviceRepository {
    /// Get a device by its identifier.
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, GardenHubError>> + Send;

    /// Get all registered devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, GardenHubError>> + Send;

    /// Create or replace a device record.
    fn upsert(&self, device: Device) -> impl Future<Output = Result<Device, GardenHubError>> + Send;

    /// Change only the control mode of an existing device.
    ///
    /// Resolves to [`GardenHubError::NotFound`] when the device is not registered.
    fn set_control_mode(
        &self,
        id: &DeviceId,
        mode: ControlMode,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send;
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for std::sync::Arc<T> {
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, GardenHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, GardenHubError>> + Send {
        (**self).get_all()
    }

    fn upsert(&self, device: Device) -> impl Future<Output = Result<Device, GardenHubError>> + Send {
        (**self).upsert(device)
    }

    fn set_control_mode(
        &self,
        id: &DeviceId,
        mode: ControlMode,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        (**self).set_control_mode(id, mode)
    }
}

/// Store of per-device [`ThresholdRule`]s.
pub trait ThresholdRuleRepository {
    /// Get the rule configured for a device, if any.
    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<ThresholdRule>, GardenHubError>> + Send;

    /// Create or replace the rule for `rule.device_id`.
    fn upsert(
        &self,
        rule: ThresholdRule,
    ) -> impl Future<Output = Result<ThresholdRule, GardenHubError>> + Send;
}

impl<T: ThresholdRuleRepository + Send + Sync> ThresholdRuleRepository for std::sync::Arc<T> {
    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<ThresholdRule>, GardenHubError>> + Send {
        (**self).get(device_id)
    }

    fn upsert(
        &self,
        rule: ThresholdRule,
    ) -> impl Future<Output = Result<ThresholdRule, GardenHubError>> + Send {
        (**self).upsert(rule)
    }
}
