//! Asynchronous hand-off of telemetry samples to the history sink.
//!
//! Ingestion only ever does a non-blocking `try_send`; a worker task drains
//! the queue into the [`TelemetrySink`]. A slow or failing sink costs dropped
//! samples, never ingestion latency.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use gardenhub_domain::telemetry::TelemetryRecord;

use crate::ports::TelemetrySink;

/// Cloneable handle feeding the telemetry worker.
#[derive(Clone)]
pub struct TelemetryRecorder {
    sender: mpsc::Sender<TelemetryRecord>,
}

impl TelemetryRecorder {
    /// Start a worker draining into `sink`, with a queue of `capacity` samples.
    ///
    /// The worker stops once every handle has been dropped and the queue is
    /// empty.
    pub fn spawn<S>(sink: S, capacity: usize) -> (Self, JoinHandle<()>)
    where
        S: TelemetrySink + Send + Sync + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(drain(sink, receiver));
        (Self { sender }, worker)
    }

    /// Queue a sample without waiting.
    ///
    /// Returns `false` when the sample was dropped.
    pub fn record(&self, record: TelemetryRecord) -> bool {
        match self.sender.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::warn!(device_id = %record.device_id, "telemetry queue full, dropping sample");
                false
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                tracing::warn!(device_id = %record.device_id, "telemetry worker stopped, dropping sample");
                false
            }
        }
    }
}

async fn drain<S: TelemetrySink>(sink: S, mut receiver: mpsc::Receiver<TelemetryRecord>) {
    while let Some(record) = receiver.recv().await {
        let device_id = record.device_id.clone();
        if let Err(err) = sink.record(record).await {
            tracing::error!(device_id = %device_id, error = %err, "failed to persist telemetry");
        }
    }
    tracing::debug!("telemetry worker stopped");
}
