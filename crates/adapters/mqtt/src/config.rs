//! Broker connection settings.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Configuration for the MQTT connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// First topic segment shared by every device, e.g. `smartgarden`.
    pub namespace: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Requests buffered between the client handle and the event loop.
    pub channel_capacity: usize,
    /// Pause before polling again after a connection error, in seconds.
    pub reconnect_delay_secs: u64,
    /// Inbound messages buffered per device before new ones are dropped.
    pub device_queue_capacity: usize,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "gardenhub".to_string(),
            namespace: "smartgarden".to_string(),
            keep_alive_secs: 30,
            channel_capacity: 64,
            reconnect_delay_secs: 5,
            device_queue_capacity: 32,
            username: None,
            password: None,
        }
    }
}

impl MqttConfig {
    /// Build the rumqttc options for this configuration.
    #[must_use]
    pub fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.broker_host, self.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options.set_credentials(username, password);
        }
        options
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id, "gardenhub");
        assert_eq!(config.namespace, "smartgarden");
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.device_queue_capacity, 32);
        assert!(config.username.is_none());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            client_id = "greenhouse"
            namespace = "garden"
            keep_alive_secs = 60
            reconnect_delay_secs = 1
            device_queue_capacity = 4
            username = "hub"
            password = "secret"
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id, "greenhouse");
        assert_eq!(config.namespace, "garden");
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(1));
        assert_eq!(config.device_queue_capacity, 4);
        assert_eq!(config.username.as_deref(), Some("hub"));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.namespace, "smartgarden");
    }

    #[test]
    fn should_carry_connection_settings_into_options() {
        let config = MqttConfig {
            broker_host: "broker".to_string(),
            broker_port: 1884,
            keep_alive_secs: 45,
            ..MqttConfig::default()
        };

        let options = config.options();

        assert_eq!(options.broker_address(), ("broker".to_string(), 1884));
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
        assert_eq!(options.client_id(), "gardenhub");
    }
}
