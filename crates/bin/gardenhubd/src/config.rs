//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `gardenhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use gardenhub_adapter_advisor_http::AdvisorConfig;
use gardenhub_adapter_mqtt::MqttConfig;
use gardenhub_app::advisory_job::AdvisoryJobConfig;
use gardenhub_app::services::chat_service::ChatConfig;
use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::id::DeviceId;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Device bus connection.
    pub mqtt: MqttConfig,
    /// Pipeline tuning.
    pub automation: AutomationConfig,
    /// Scheduled advisor consultation.
    pub advisory: AdvisoryConfig,
    /// Devices registered at startup.
    pub devices: Vec<DeviceSeed>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Upper bound on a single command publish, in seconds.
    pub publish_timeout_secs: u64,
    /// Telemetry samples buffered ahead of the history writer.
    pub telemetry_queue_capacity: usize,
    /// Updates buffered per SSE subscriber before it starts lagging.
    pub broadcast_capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub advisor_timeout_secs: u64,
    pub weather_timeout_secs: u64,
    pub prompt: String,
    pub location: String,
    /// Devices to advise on; empty means every registered device.
    pub devices: Vec<String>,
    pub advisor: AdvisorConfig,
}

/// A registry entry declared in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSeed {
    pub device_id: String,
    pub name: String,
    #[serde(default)]
    pub control_mode: ControlMode,
}

impl Config {
    /// Load configuration from `gardenhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("gardenhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GARDENHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("GARDENHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("GARDENHUB_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("GARDENHUB_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.broker_port = port;
            }
        }
        if let Ok(val) = std::env::var("GARDENHUB_ADVISOR_URL") {
            self.advisory.advisor.url = val;
        }
        if let Ok(val) = std::env::var("GARDENHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        let namespace = &self.mqtt.namespace;
        if namespace.is_empty() || namespace.contains(['/', '+', '#']) {
            return Err(ConfigError::Validation(format!(
                "mqtt namespace {namespace:?} must be a single non-empty topic segment"
            )));
        }
        if self.automation.telemetry_queue_capacity == 0 || self.automation.broadcast_capacity == 0 {
            return Err(ConfigError::Validation(
                "automation queue capacities must be non-zero".to_string(),
            ));
        }
        if self.advisory.enabled && self.advisory.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "advisory interval must be non-zero".to_string(),
            ));
        }
        self.seed_devices()?;
        self.advisory.device_ids()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// The `[[devices]]` entries as registry records.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an invalid id or blank name.
    pub fn seed_devices(&self) -> Result<Vec<Device>, ConfigError> {
        self.devices
            .iter()
            .map(|seed| {
                let device_id = parse_device_id(&seed.device_id)?;
                Device::builder()
                    .device_id(device_id)
                    .name(seed.name.clone())
                    .control_mode(seed.control_mode)
                    .build()
                    .map_err(|err| {
                        ConfigError::Validation(format!("device {:?}: {err}", seed.device_id))
                    })
            })
            .collect()
    }
}

impl AutomationConfig {
    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

impl AdvisoryConfig {
    /// Tuning handed to the advisory job.
    #[must_use]
    pub fn job_config(&self) -> AdvisoryJobConfig {
        AdvisoryJobConfig {
            interval: Duration::from_secs(self.interval_secs),
            advisor_timeout: Duration::from_secs(self.advisor_timeout_secs),
            weather_timeout: Duration::from_secs(self.weather_timeout_secs),
            prompt: self.prompt.clone(),
            location: self.location.clone(),
        }
    }

    /// Tuning for on-demand chat; shares the advisor and weather settings
    /// with the scheduled job.
    #[must_use]
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            advisor_timeout: Duration::from_secs(self.advisor_timeout_secs),
            weather_timeout: Duration::from_secs(self.weather_timeout_secs),
            location: self.location.clone(),
        }
    }

    /// The explicitly monitored devices.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an invalid id.
    pub fn device_ids(&self) -> Result<Vec<DeviceId>, ConfigError> {
        self.devices.iter().map(|id| parse_device_id(id)).collect()
    }
}

fn parse_device_id(raw: &str) -> Result<DeviceId, ConfigError> {
    DeviceId::from_str(raw)
        .map_err(|err| ConfigError::Validation(format!("device id {raw:?}: {err}")))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:gardenhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "gardenhubd=info,gardenhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            publish_timeout_secs: 5,
            telemetry_queue_capacity: 1024,
            broadcast_capacity: 256,
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        let job = AdvisoryJobConfig::default();
        Self {
            enabled: false,
            interval_secs: job.interval.as_secs(),
            advisor_timeout_secs: job.advisor_timeout.as_secs(),
            weather_timeout_secs: job.weather_timeout.as_secs(),
            prompt: job.prompt,
            location: job.location,
            devices: Vec::new(),
            advisor: AdvisorConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
