//! Advisor chat handler.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/devices/{id}/chat`.
#[derive(Deserialize)]
pub struct ChatBody {
    pub message: String,
}

/// The advisor's answer, already acted upon for `AUTO` devices.
#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /api/devices/{id}/chat`
pub async fn send<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
    Path(id): Path<String>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let reply = state.chat_service.chat(&device_id, &body.message).await?;
    Ok(Json(ChatResponse { response: reply.text }))
}
