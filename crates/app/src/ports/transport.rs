//! Command transport port: the outbound side of the device bus.

use std::future::Future;

use gardenhub_domain::error::GardenHubError;

/// Publishes encoded commands to devices.
///
/// Delivery is at-most-once: implementations must not retry on their own.
pub trait CommandTransport {
    /// Publish `payload` on `topic`.
    ///
    /// Resolves once the transport has accepted the message, not when the
    /// device has acted on it.
    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send;
}

impl<T: CommandTransport + Send + Sync> CommandTransport for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        (**self).publish(topic, payload)
    }
}
