//! Update broadcaster port: fan-out of state changes and advisories.

use std::future::Future;

use gardenhub_domain::advisory::Advisory;
use gardenhub_domain::device_state::DeviceState;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::event::Update;

/// Publishes [`Update`]s to interested observers.
///
/// Callers treat publishing as fire-and-forget: an error is logged, never
/// propagated further.
pub trait UpdateBroadcaster {
    /// Publish an update to all current observers.
    fn publish(&self, update: Update) -> impl Future<Output = Result<(), GardenHubError>> + Send;

    /// Publish a changed device snapshot.
    fn publish_state(
        &self,
        state: DeviceState,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        self.publish(Update::DeviceState(state))
    }

    /// Publish an advisory notification.
    fn publish_advisory(
        &self,
        advisory: Advisory,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        self.publish(Update::Advisory(advisory))
    }
}

impl<T: UpdateBroadcaster + Send + Sync> UpdateBroadcaster for std::sync::Arc<T> {
    fn publish(&self, update: Update) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        (**self).publish(update)
    }
}
