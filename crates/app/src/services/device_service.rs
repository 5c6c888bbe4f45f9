//! Device service: use-cases for the device registry.

use gardenhub_domain::device::Device;
use gardenhub_domain::error::{GardenHubError, NotFoundError};
use gardenhub_domain::id::DeviceId;

use crate::ports::DeviceRepository;

/// Application service for registry reads and seeding.
pub struct DeviceService<R> {
    repo: R,
}

impl<R: DeviceRepository> DeviceService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a device, or update the name of an existing one.
    ///
    /// The control mode of an already registered device is kept: it may have
    /// been changed at runtime and the registry is authoritative for it.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.device_id))]
    pub async fn register_device(&self, device: Device) -> Result<Device, GardenHubError> {
        device.validate()?;
        let device = match self.repo.get_by_id(&device.device_id).await? {
            Some(existing) => Device {
                control_mode: existing.control_mode,
                ..device
            },
            None => device,
        };
        self.repo.upsert(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, GardenHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, GardenHubError> {
        self.repo.get_all().await
    }
}
