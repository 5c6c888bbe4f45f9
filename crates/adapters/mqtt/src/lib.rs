//! # gardenhub-adapter-mqtt
//!
//! MQTT adapter: the device bus.
//!
//! ## Responsibilities
//! - Connect to the broker and keep the connection alive
//! - Subscribe to `<namespace>/device/+/{telemetry,status,state}`
//! - Feed inbound messages to the [`Ingestor`](gardenhub_app::ingest::Ingestor)
//!   through one ordered queue per device
//! - Publish commands on `<namespace>/device/<id>/command`
//!
//! ## Dependency rule
//! Same as other adapters: depends on `gardenhub-app` and `gardenhub-domain`.

mod bridge;
pub mod config;
pub mod error;
mod transport;

pub use bridge::MqttBridge;
pub use config::MqttConfig;
pub use error::MqttError;
pub use transport::MqttCommandTransport;

/// Create the client pair for `config`.
///
/// Nothing touches the network until [`MqttBridge::run`] polls the event
/// loop; commands published before that are queued.
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttCommandTransport, MqttBridge) {
    let (client, eventloop) = rumqttc::AsyncClient::new(config.options(), config.channel_capacity.max(1));
    tracing::debug!(
        host = %config.broker_host,
        port = config.broker_port,
        client_id = %config.client_id,
        "MQTT client created"
    );
    let bridge = MqttBridge::new(
        client.clone(),
        eventloop,
        config.namespace.clone(),
        config.reconnect_delay(),
        config.device_queue_capacity,
    );
    (MqttCommandTransport::new(client), bridge)
}
