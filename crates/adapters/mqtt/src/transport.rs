//! Outbound commands over MQTT.

use std::future::Future;

use gardenhub_app::ports::CommandTransport;
use gardenhub_domain::error::GardenHubError;
use rumqttc::{AsyncClient, QoS};

use crate::error::MqttError;

/// [`CommandTransport`] backed by a rumqttc client handle.
///
/// Commands go out at QoS 1 and are never retained: a device that comes
/// online later must not act on a stale command.
#[derive(Clone)]
pub struct MqttCommandTransport {
    client: AsyncClient,
}

impl MqttCommandTransport {
    #[must_use]
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl CommandTransport for MqttCommandTransport {
    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        async move {
            tracing::trace!(%topic, bytes = payload.len(), "publishing command");
            self.client
                .publish(topic, QoS::AtLeastOnce, false, payload)
                .await
                .map_err(MqttError::from)?;
            Ok(())
        }
    }
}
