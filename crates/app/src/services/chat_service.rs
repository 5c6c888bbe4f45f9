//! Chat service: a person asks the advisor about one device.
//!
//! The advisor sees the same context as on a scheduled round (cached state,
//! weather, control mode) plus the person's message. A text answer is
//! returned as-is. A tool call is carried out through the [`CommandService`]
//! when the device is in `AUTO` mode and only described in `MANUAL` mode.

use std::sync::Arc;
use std::time::Duration;

use gardenhub_domain::advisory::{Advisory, AdvisorResponse, AdvisoryRequest};
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::{GardenHubError, NotFoundError, ValidationError};
use gardenhub_domain::id::DeviceId;

use crate::advisory_job::weather_or_unknown;
use crate::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use crate::services::command_service::CommandService;

/// Tuning for [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub advisor_timeout: Duration,
    pub weather_timeout: Duration,
    pub location: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            advisor_timeout: Duration::from_secs(30),
            weather_timeout: Duration::from_secs(10),
            location: "unknown".to_string(),
        }
    }
}

/// The advisor's answer to one chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// A command went out on the advisor's behalf.
    pub executed: bool,
}

impl ChatReply {
    fn said(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            executed: false,
        }
    }
}

/// Application service behind the chat endpoint.
pub struct ChatService<A, W, D, R, T, B> {
    advisor: A,
    weather: W,
    devices: D,
    commands: Arc<CommandService<D, R, T, B>>,
    broadcaster: B,
    config: ChatConfig,
}

impl<A, W, D, R, T, B> ChatService<A, W, D, R, T, B>
where
    A: Advisor,
    W: WeatherProvider,
    D: DeviceRepository,
    R: ThresholdRuleRepository,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    pub fn new(
        advisor: A,
        weather: W,
        devices: D,
        commands: Arc<CommandService<D, R, T, B>>,
        broadcaster: B,
        config: ChatConfig,
    ) -> Self {
        Self {
            advisor,
            weather,
            devices,
            commands,
            broadcaster,
            config,
        }
    }

    /// Ask the advisor about `device_id` on behalf of a person.
    ///
    /// # Errors
    ///
    /// - [`GardenHubError::Validation`] for a blank message
    /// - [`GardenHubError::NotFound`] for a device missing from the registry
    /// - [`GardenHubError::Transport`] when the advisor fails or times out
    /// - any error of the command the advisor asked for
    #[tracing::instrument(skip(self, message), fields(device_id = %device_id))]
    pub async fn chat(&self, device_id: &DeviceId, message: &str) -> Result<ChatReply, GardenHubError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let Some(device) = self.devices.get_by_id(device_id).await? else {
            return Err(NotFoundError {
                entity: "Device",
                id: device_id.to_string(),
            }
            .into());
        };
        let mode = device.control_mode;

        let request = AdvisoryRequest {
            prompt: message.to_string(),
            device_id: device_id.clone(),
            garden: self.commands.cache().get(device_id).await,
            weather: weather_or_unknown(&self.weather, &self.config.location, self.config.weather_timeout).await,
            mode,
        };
        let response = tokio::time::timeout(self.config.advisor_timeout, self.advisor.advise(request))
            .await
            .map_err(GardenHubError::transport)??;

        let call = match response {
            AdvisorResponse::Text(text) => return Ok(ChatReply::said(text)),
            AdvisorResponse::ToolCall(call) => call,
        };
        let planned = match call.plan(device_id) {
            Ok(planned) => planned,
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "advisor asked for something the hub cannot do");
                return Ok(ChatReply::said(format!("Cannot do that: {err}")));
            }
        };
        if mode == ControlMode::Manual {
            return Ok(ChatReply::said(format!("Suggested: {}", planned.summary)));
        }

        self.commands.send_command(planned.command).await?;
        tracing::info!(action = %planned.summary, "executed advisor action from chat");
        let advisory = Advisory::new(device_id.clone(), mode, format!("Executed: {}", planned.summary));
        if let Err(err) = self.broadcaster.publish_advisory(advisory).await {
            tracing::warn!(error = %err, "failed to broadcast advisory");
        }
        Ok(ChatReply {
            text: format!("Done: {}", planned.summary),
            executed: true,
        })
    }
}
