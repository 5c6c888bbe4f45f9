//! In-process update broadcaster backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::event::Update;

use crate::ports::UpdateBroadcaster;

/// In-process broadcaster using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the update is simply dropped). Slow subscribers lag and miss updates
/// rather than slowing down ingestion.
pub struct InProcessBroadcaster {
    sender: broadcast::Sender<Update>,
}

impl InProcessBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to updates.
    ///
    /// Returns a receiver that will get all updates published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.sender.subscribe()
    }
}

impl UpdateBroadcaster for InProcessBroadcaster {
    fn publish(&self, update: Update) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        // send only fails when nobody is listening
        let _ = self.sender.send(update);
        async { Ok(()) }
    }
}
