//! Scheduled advisory job.
//!
//! Every monitored device gets its own ticking task. On each tick the
//! external advisor is asked about the device; what happens with the answer
//! depends on the device's control mode as recorded in the registry:
//!
//! - `AUTO`: a recognised tool call is executed through the
//!   [`CommandService`] and announced.
//! - `MANUAL`: the tool call is only described in a notification.
//!
//! Free-text answers become notifications in both modes. A notification
//! identical to the previous one for the same device is suppressed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use gardenhub_domain::advisory::{Advisory, AdvisorResponse, AdvisoryRequest, WeatherContext};
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::id::DeviceId;

use crate::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use crate::services::command_service::CommandService;

/// Tuning for [`AdvisoryJob`].
#[derive(Debug, Clone)]
pub struct AdvisoryJobConfig {
    pub interval: Duration,
    pub advisor_timeout: Duration,
    pub weather_timeout: Duration,
    pub prompt: String,
    pub location: String,
}

impl Default for AdvisoryJobConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            advisor_timeout: Duration::from_secs(30),
            weather_timeout: Duration::from_secs(10),
            prompt: "Check the garden and decide whether it needs watering.".to_string(),
            location: "unknown".to_string(),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Device unknown, registry or advisor unavailable.
    Skipped,
    /// A notification was published.
    Advised,
    /// A tool call was executed (AUTO only).
    Executed,
    /// Same notification as last time; nothing published.
    Duplicate,
    /// The advisor proposed something the hub cannot do.
    Unsupported,
    /// Executing the tool call failed.
    Failed,
}

/// Periodic advisor consultation for a set of devices.
pub struct AdvisoryJob<A, W, D, R, T, B> {
    advisor: A,
    weather: W,
    devices: D,
    commands: Arc<CommandService<D, R, T, B>>,
    broadcaster: B,
    config: AdvisoryJobConfig,
    last_message: Mutex<HashMap<DeviceId, String>>,
}

impl<A, W, D, R, T, B> AdvisoryJob<A, W, D, R, T, B>
where
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    pub fn new(
        advisor: A,
        weather: W,
        devices: D,
        commands: Arc<CommandService<D, R, T, B>>,
        broadcaster: B,
        config: AdvisoryJobConfig,
    ) -> Self {
        Self {
            advisor,
            weather,
            devices,
            commands,
            broadcaster,
            config,
            last_message: Mutex::default(),
        }
    }

    /// Spawn one ticking task per monitored device.
    ///
    /// `configured` lists the devices to monitor; when empty, every device
    /// in the registry is monitored.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the registry cannot be listed.
    pub async fn start(self: Arc<Self>, configured: Vec<DeviceId>) -> Result<Vec<JoinHandle<()>>, GardenHubError> {
        let device_ids = if configured.is_empty() {
            self.devices
                .get_all()
                .await?
                .into_iter()
                .map(|device| device.device_id)
                .collect()
        } else {
            configured
        };
        tracing::info!(devices = device_ids.len(), interval = ?self.config.interval, "advisory job started");

        Ok(device_ids
            .into_iter()
            .map(|device_id| tokio::spawn(Arc::clone(&self).run(device_id)))
            .collect())
    }

    async fn run(self: Arc<Self>, device_id: DeviceId) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let outcome = self.tick(&device_id).await;
            tracing::debug!(device_id = %device_id, ?outcome, "advisory tick done");
        }
    }

    /// Run a single advisory round for one device.
    #[tracing::instrument(skip(self))]
    pub async fn tick(&self, device_id: &DeviceId) -> TickOutcome {
        let mode = match self.devices.get_by_id(device_id).await {
            Ok(Some(device)) => device.control_mode,
            Ok(None) => {
                tracing::debug!("device not registered, skipping");
                return TickOutcome::Skipped;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read control mode");
                return TickOutcome::Skipped;
            }
        };

        let request = AdvisoryRequest {
            prompt: self.config.prompt.clone(),
            device_id: device_id.clone(),
            garden: self.commands.cache().get(device_id).await,
            weather: self.weather_context().await,
            mode,
        };
        let response = match tokio::time::timeout(self.config.advisor_timeout, self.advisor.advise(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "advisor call failed");
                return TickOutcome::Skipped;
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.advisor_timeout, "advisor call timed out");
                return TickOutcome::Skipped;
            }
        };

        match response {
            AdvisorResponse::Text(text) => self.notify(device_id, mode, text).await,
            AdvisorResponse::ToolCall(call) => {
                let planned = match call.plan(device_id) {
                    Ok(planned) => planned,
                    Err(err) => {
                        tracing::warn!(tool = %call.name, error = %err, "ignoring tool call");
                        return TickOutcome::Unsupported;
                    }
                };
                match mode {
                    ControlMode::Manual => {
                        self.notify(device_id, mode, format!("Suggested: {}", planned.summary))
                            .await
                    }
                    ControlMode::Auto => match self.commands.send_command(planned.command).await {
                        Ok(_) => {
                            let message = format!("Executed: {}", planned.summary);
                            self.last_message
                                .lock()
                                .await
                                .insert(device_id.clone(), message.clone());
                            self.publish(device_id, mode, message).await;
                            TickOutcome::Executed
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "failed to execute advisor action");
                            TickOutcome::Failed
                        }
                    },
                }
            }
        }
    }

    async fn weather_context(&self) -> WeatherContext {
        weather_or_unknown(&self.weather, &self.config.location, self.config.weather_timeout).await
    }

    async fn notify(&self, device_id: &DeviceId, mode: ControlMode, message: String) -> TickOutcome {
        {
            let mut last = self.last_message.lock().await;
            if last.get(device_id) == Some(&message) {
                tracing::debug!("same advice as last time, suppressed");
                return TickOutcome::Duplicate;
            }
            last.insert(device_id.clone(), message.clone());
        }
        self.publish(device_id, mode, message).await;
        TickOutcome::Advised
    }

    async fn publish(&self, device_id: &DeviceId, mode: ControlMode, message: String) {
        let advisory = Advisory::new(device_id.clone(), mode, message);
        if let Err(err) = self.broadcaster.publish_advisory(advisory).await {
            tracing::warn!(error = %err, "failed to broadcast advisory");
        }
    }
}

/// Weather for `location`, or an unknown forecast when the lookup fails or
/// takes longer than `timeout`.
pub(crate) async fn weather_or_unknown<W: WeatherProvider>(
    weather: &W,
    location: &str,
    timeout: Duration,
) -> WeatherContext {
    match tokio::time::timeout(timeout, weather.current(location)).await {
        Ok(Ok(weather)) => weather,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "weather lookup failed");
            WeatherContext::unknown(location)
        }
        Err(_) => {
            tracing::warn!("weather lookup timed out");
            WeatherContext::unknown(location)
        }
    }
}
