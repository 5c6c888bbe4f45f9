//! Inbound side: drives the rumqttc event loop and feeds the ingestor.
//!
//! The poll loop never handles a message itself. Each device gets its own
//! bounded queue drained by a dedicated task, so messages for one device are
//! applied in arrival order while a device stuck behind its lock cannot hold
//! up the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gardenhub_app::ingest::Ingestor;
use gardenhub_app::ports::{CommandTransport, ThresholdRuleRepository, UpdateBroadcaster};
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::topic::{Topic, subscription_filters};
use rumqttc::{AsyncClient, Event, EventLoop, Packet, Publish, QoS};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::MqttError;

/// Owns the event loop of one broker connection.
pub struct MqttBridge {
    client: AsyncClient,
    eventloop: EventLoop,
    namespace: String,
    reconnect_delay: Duration,
    device_queue_capacity: usize,
}

enum Inbound {
    Connected,
    Message(Publish),
    Other,
}

impl From<Event> for Inbound {
    fn from(event: Event) -> Self {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => Self::Connected,
            Event::Incoming(Packet::Publish(publish)) => Self::Message(publish),
            _ => Self::Other,
        }
    }
}

impl MqttBridge {
    pub(crate) fn new(
        client: AsyncClient,
        eventloop: EventLoop,
        namespace: String,
        reconnect_delay: Duration,
        device_queue_capacity: usize,
    ) -> Self {
        Self {
            client,
            eventloop,
            namespace,
            reconnect_delay,
            device_queue_capacity,
        }
    }

    /// Poll the connection forever, queueing each device message for that
    /// device's worker.
    ///
    /// Subscriptions are (re)issued on every `ConnAck`, so a broker restart
    /// is survived without losing the device filters. Connection errors are
    /// logged and retried after the reconnect delay.
    pub async fn run<R, T, B>(mut self, ingestor: Arc<Ingestor<R, T, B>>)
    where
        R: ThresholdRuleRepository + Send + Sync + 'static,
        T: CommandTransport + Send + Sync + 'static,
        B: UpdateBroadcaster + Send + Sync + 'static,
    {
        let mut queues = DeviceQueues::new(ingestor, self.device_queue_capacity);
        loop {
            match self.eventloop.poll().await {
                Ok(event) => match Inbound::from(event) {
                    Inbound::Connected => {
                        tracing::info!(namespace = %self.namespace, "connected to MQTT broker");
                        if let Err(err) = subscribe(&self.client, &self.namespace).await {
                            tracing::error!(error = %err, "failed to subscribe to device topics");
                        }
                    }
                    Inbound::Message(publish) => {
                        tracing::trace!(topic = %publish.topic, "message received");
                        queues.dispatch(publish);
                    }
                    Inbound::Other => {}
                },
                Err(err) => {
                    let err = MqttError::Connection(err);
                    tracing::warn!(
                        error = %err,
                        source = ?std::error::Error::source(&err),
                        retry_in = ?self.reconnect_delay,
                        "MQTT connection lost"
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

}

async fn subscribe(client: &AsyncClient, namespace: &str) -> Result<(), MqttError> {
    for filter in subscription_filters(namespace) {
        tracing::debug!(%filter, "subscribing");
        client.subscribe(filter, QoS::AtLeastOnce).await?;
    }
    Ok(())
}

/// One ordered queue and worker task per device.
struct DeviceQueues<R, T, B> {
    ingestor: Arc<Ingestor<R, T, B>>,
    capacity: usize,
    workers: HashMap<DeviceId, mpsc::Sender<Publish>>,
}

impl<R, T, B> DeviceQueues<R, T, B>
where
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    fn new(ingestor: Arc<Ingestor<R, T, B>>, capacity: usize) -> Self {
        Self {
            ingestor,
            capacity: capacity.max(1),
            workers: HashMap::new(),
        }
    }

    /// Queue `publish` behind earlier messages of the same device.
    ///
    /// Never waits: a full queue drops the message.
    fn dispatch(&mut self, publish: Publish) {
        let device_id = match Topic::parse(self.ingestor.namespace(), &publish.topic) {
            Ok(topic) => topic.device_id,
            Err(err) => {
                tracing::warn!(topic = %publish.topic, error = %err, "dropping message on malformed topic");
                return;
            }
        };

        let sender = self
            .workers
            .entry(device_id.clone())
            .or_insert_with(|| spawn_worker(Arc::clone(&self.ingestor), device_id.clone(), self.capacity));
        let publish = match sender.try_send(publish) {
            Ok(()) => return,
            Err(TrySendError::Full(publish)) => {
                tracing::warn!(%device_id, topic = %publish.topic, "device queue full, dropping message");
                return;
            }
            Err(TrySendError::Closed(publish)) => publish,
        };

        tracing::warn!(%device_id, "device worker stopped, restarting it");
        let sender = spawn_worker(Arc::clone(&self.ingestor), device_id.clone(), self.capacity);
        if sender.try_send(publish).is_err() {
            tracing::warn!(%device_id, "dropping message for restarted device worker");
        }
        self.workers.insert(device_id, sender);
    }
}

fn spawn_worker<R, T, B>(
    ingestor: Arc<Ingestor<R, T, B>>,
    device_id: DeviceId,
    capacity: usize,
) -> mpsc::Sender<Publish>
where
    R: ThresholdRuleRepository + Send + Sync + 'static,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<Publish>(capacity);
    tracing::debug!(%device_id, "starting device worker");
    tokio::spawn(async move {
        while let Some(publish) = receiver.recv().await {
            ingestor.handle(&publish.topic, &publish.payload).await;
        }
        tracing::debug!(%device_id, "device worker finished");
    });
    sender
}
