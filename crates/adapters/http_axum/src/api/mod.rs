//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod chat;
#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod thresholds;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<D, R, T, B, A, W>() -> Router<AppState<D, R, T, B, A, W>>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    Router::new()
        // Registry and live state
        .route("/devices", get(devices::list::<D, R, T, B, A, W>))
        .route("/devices/{id}/state", get(devices::state::<D, R, T, B, A, W>))
        .route("/states", get(devices::states::<D, R, T, B, A, W>))
        // Commands
        .route("/devices/{id}/command", post(commands::send::<D, R, T, B, A, W>))
        // Advisor chat
        .route("/devices/{id}/chat", post(chat::send::<D, R, T, B, A, W>))
        // Thresholds
        .route(
            "/thresholds/{id}",
            get(thresholds::get::<D, R, T, B, A, W>).put(thresholds::put::<D, R, T, B, A, W>),
        )
        // Updates
        .route("/updates/stream", get(sse::stream::<D, R, T, B, A, W>))
}

/// Parse a device id taken from the request path.
fn parse_device_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::from_str(raw).map_err(|err| ApiError::from(GardenHubError::from(err)))
}
