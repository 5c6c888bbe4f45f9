//! Device registry and live state handlers.

use axum::Json;
use axum::extract::{Path, State};

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::DeviceState;

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/devices`
pub async fn list<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(Json(devices))
}

/// `GET /api/devices/{id}/state`
///
/// A device never heard from reads as the default offline snapshot.
pub async fn state<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceState>, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    Ok(Json(state.cache().get(&device_id).await))
}

/// `GET /api/states`
pub async fn states<D, R, T, B, A, W>(State(state): State<AppState<D, R, T, B, A, W>>) -> Json<Vec<DeviceState>>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    Json(state.cache().snapshot().await)
}
