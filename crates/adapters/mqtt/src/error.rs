//! MQTT adapter error types.

use gardenhub_domain::error::GardenHubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The client request queue rejected the request (event loop gone).
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),
}

impl MqttError {
    /// Convert into a [`GardenHubError::Transport`] for propagation across
    /// port boundaries.
    pub fn into_domain(self) -> GardenHubError {
        GardenHubError::transport(self)
    }
}

impl From<MqttError> for GardenHubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

impl From<rumqttc::ClientError> for MqttError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Client(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_error() -> rumqttc::ClientError {
        let (client, eventloop) =
            rumqttc::AsyncClient::new(rumqttc::MqttOptions::new("test", "127.0.0.1", 1883), 1);
        drop(eventloop);
        client
            .try_publish("t", rumqttc::QoS::AtLeastOnce, false, Vec::new())
            .unwrap_err()
    }

    #[test]
    fn should_convert_client_error_to_transport_error() {
        let err: GardenHubError = MqttError::from(client_error()).into();
        assert!(err.is_transport());
    }

    #[test]
    fn should_display_client_error() {
        let err = MqttError::Client(client_error());
        assert_eq!(err.to_string(), "MQTT client error");
    }
}
