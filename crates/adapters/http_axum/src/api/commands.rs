//! Manual command handler.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_domain::command::CommandRequest;
use gardenhub_domain::device_state::DeviceState;
use gardenhub_domain::error::GardenHubError;

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/devices/{id}/command`.
#[derive(Deserialize)]
pub struct CommandBody {
    pub action: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// Possible responses from the command endpoint.
pub enum SendResponse {
    /// The command was published; the body is the optimistic snapshot.
    Accepted(Json<DeviceState>),
}

impl IntoResponse for SendResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// `POST /api/devices/{id}/command`
pub async fn send<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
    Path(id): Path<String>,
    Json(body): Json<CommandBody>,
) -> Result<SendResponse, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let request = CommandRequest::new(device_id, body.action, body.payload)
        .map_err(|err| ApiError::from(GardenHubError::from(err)))?;
    let snapshot = state.command_service.send_command(request).await?;
    Ok(SendResponse::Accepted(Json(snapshot)))
}
