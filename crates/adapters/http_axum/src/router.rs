//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<D, R, T, B, A, W>(state: AppState<D, R, T, B, A, W>) -> Router
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
