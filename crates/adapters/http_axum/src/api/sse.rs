//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_domain::event::Update;

use crate::state::AppState;

/// `GET /api/updates/stream`: state changes and advisories as SSE `data:`
/// frames.
///
/// The stream continues until the client disconnects. A client that falls
/// behind skips the updates it missed.
pub async fn stream<D, R, T, B, A, W>(
    State(state): State<AppState<D, R, T, B, A, W>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    let updates = BroadcastStream::new(state.updates.subscribe()).filter_map(|result| match result {
        Ok(update) => frame(&update).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some updates were dropped");
            None
        }
    });

    Sse::new(updates).keep_alive(KeepAlive::default())
}

fn frame(update: &Update) -> Option<Event> {
    match serde_json::to_string(update) {
        Ok(json) => Some(Event::default().data(json)),
        Err(err) => {
            tracing::warn!(%err, device_id = %update.device_id(), "failed to encode update for SSE");
            None
        }
    }
}
