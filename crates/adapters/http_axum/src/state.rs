//! Shared application state for axum handlers.

use std::sync::Arc;

use gardenhub_app::broadcaster::InProcessBroadcaster;
use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster,
    WeatherProvider,
};
use gardenhub_app::services::chat_service::ChatService;
use gardenhub_app::services::command_service::CommandService;
use gardenhub_app::services::device_service::DeviceService;
use gardenhub_app::services::threshold_service::ThresholdService;
use gardenhub_app::state_cache::StateCache;

/// Application state shared across all axum handlers.
///
/// Generic over the registry, rule store, transport, broadcaster, advisor and
/// weather types to avoid dynamic dispatch. `Clone` is implemented manually
/// so the underlying types themselves do not need to be `Clone`; only the
/// `Arc` wrappers are cloned.
pub struct AppState<D, R, T, B, A, W> {
    /// Device registry service.
    pub device_service: Arc<DeviceService<D>>,
    /// Threshold rule service.
    pub threshold_service: Arc<ThresholdService<R>>,
    /// Manual command entry point; also owns the state cache.
    pub command_service: Arc<CommandService<D, R, T, B>>,
    /// Advisor questions asked from the dashboard.
    pub chat_service: Arc<ChatService<A, W, D, R, T, B>>,
    /// Source of the SSE update stream.
    pub updates: Arc<InProcessBroadcaster>,
}

impl<D, R, T, B, A, W> Clone for AppState<D, R, T, B, A, W> {
    fn clone(&self) -> Self {
        Self {
            device_service: Arc::clone(&self.device_service),
            threshold_service: Arc::clone(&self.threshold_service),
            command_service: Arc::clone(&self.command_service),
            chat_service: Arc::clone(&self.chat_service),
            updates: Arc::clone(&self.updates),
        }
    }
}

impl<D, R, T, B, A, W> AppState<D, R, T, B, A, W>
where
    D: DeviceRepository + Send + Sync + 'static,
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
    A: Advisor + Send + Sync + 'static,
    W: WeatherProvider + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The command service is shared with the advisory job and the chat
    /// service, so both are taken already wrapped.
    pub fn new(
        device_service: DeviceService<D>,
        threshold_service: ThresholdService<R>,
        command_service: Arc<CommandService<D, R, T, B>>,
        chat_service: Arc<ChatService<A, W, D, R, T, B>>,
        updates: Arc<InProcessBroadcaster>,
    ) -> Self {
        Self {
            device_service: Arc::new(device_service),
            threshold_service: Arc::new(threshold_service),
            command_service,
            chat_service,
            updates,
        }
    }

    /// The live device snapshots.
    #[must_use]
    pub fn cache(&self) -> &Arc<StateCache> {
        self.command_service.cache()
    }
}
