//! Command dispatcher: optimistic cache update, then publish.
//!
//! Local readers see the intended effect of a command immediately, even
//! when the device is slow or offline. The device's own `state` report
//! reconciles the cache later.

use std::sync::Arc;
use std::time::Duration;

use gardenhub_domain::command::CommandRequest;
use gardenhub_domain::device_state::DeviceState;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::topic::command_topic;

use crate::ports::{CommandTransport, UpdateBroadcaster};
use crate::state_cache::{DeviceLock, StateCache};

/// Upper bound on a single publish unless configured otherwise.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Serializes, folds and publishes outbound commands.
pub struct CommandDispatcher<T, B> {
    cache: Arc<StateCache>,
    transport: T,
    broadcaster: B,
    namespace: String,
    publish_timeout: Duration,
}

impl<T, B> CommandDispatcher<T, B>
where
    T: CommandTransport,
    B: UpdateBroadcaster,
{
    /// Create a dispatcher publishing under `<namespace>/device/<id>/command`.
    pub fn new(cache: Arc<StateCache>, transport: T, broadcaster: B, namespace: impl Into<String>) -> Self {
        Self {
            cache,
            transport,
            broadcaster,
            namespace: namespace.into(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    /// The cache this dispatcher folds commands into.
    #[must_use]
    pub fn cache(&self) -> &Arc<StateCache> {
        &self.cache
    }

    /// Lock the target device and dispatch.
    ///
    /// # Errors
    ///
    /// See [`send_locked`](Self::send_locked).
    pub async fn send(&self, request: CommandRequest) -> Result<DeviceState, GardenHubError> {
        let lock = self.cache.lock(&request.device_id).await;
        self.send_locked(&lock, request).await
    }

    /// Dispatch a command for a device whose lock the caller already holds.
    ///
    /// Returns the snapshot after the optimistic update. A failed publish
    /// keeps the optimistic update in the cache.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] when a recognised action has an
    /// invalid payload and [`GardenHubError::Serialization`] when the command
    /// cannot be encoded; nothing is changed or published in either case.
    /// Returns [`GardenHubError::Transport`] when the publish fails or
    /// exceeds the publish timeout.
    #[tracing::instrument(skip(self, lock, request), fields(device_id = %request.device_id, action = %request.action))]
    pub async fn send_locked(
        &self,
        lock: &DeviceLock,
        request: CommandRequest,
    ) -> Result<DeviceState, GardenHubError> {
        debug_assert_eq!(lock.device_id(), &request.device_id);
        let action = request.interpret()?;
        let payload = request.to_wire()?;

        let current = self.cache.get(&request.device_id).await;
        let state = match current.with_command(&action) {
            Some(next) => {
                self.cache.store(lock, next.clone()).await;
                if let Err(err) = self.broadcaster.publish_state(next.clone()).await {
                    tracing::warn!(error = %err, "failed to broadcast optimistic update");
                }
                next
            }
            None => current,
        };

        let topic = command_topic(&self.namespace, &request.device_id);
        match tokio::time::timeout(self.publish_timeout, self.transport.publish(topic, payload)).await {
            Ok(Ok(())) => {
                tracing::debug!("command published");
                Ok(state)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "command publish failed");
                Err(err)
            }
            Err(elapsed) => {
                tracing::warn!(timeout = ?self.publish_timeout, "command publish timed out");
                Err(GardenHubError::transport(elapsed))
            }
        }
    }
}
