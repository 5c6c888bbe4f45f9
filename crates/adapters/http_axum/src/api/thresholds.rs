//! Threshold rule handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_domain::threshold::ThresholdRule;

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `PUT /api/thresholds/{id}`; the device comes from the path.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdBody {
    pub min_soil_moisture: f64,
    pub max_pump_duration_seconds: u64,
    #[serde(default = "enabled", alias = "isActive")]
    pub active: bool,
}

fn enabled() -> bool {
    true
}

/// `GET /api/thresholds/{id}`
pub async fn get<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
    Path(id): Path<String>,
) -> Result<Json<ThresholdRule>, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let rule = state.threshold_service.get_rule(&device_id).await?;
    Ok(Json(rule))
}

/// `PUT /api/thresholds/{id}`
pub async fn put<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
    Path(id): Path<String>,
    Json(body): Json<ThresholdBody>,
) -> Result<Json<ThresholdRule>, ApiError>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let rule = ThresholdRule {
        device_id: parse_device_id(&id)?,
        min_soil_moisture: body.min_soil_moisture,
        max_pump_duration_seconds: body.max_pump_duration_seconds,
        active: body.active,
    };
    let saved = state.threshold_service.save_rule(rule).await?;
    Ok(Json(saved))
}
