//! Inbound pipeline: topic routing, merge, broadcast, persistence hand-off
//! and threshold evaluation.

use std::sync::Arc;

use gardenhub_domain::telemetry::TelemetryRecord;
use gardenhub_domain::time::now;
use gardenhub_domain::topic::{MessageKind, Topic};

use crate::automation_engine::{AutomationEngine, Evaluation};
use crate::ports::{CommandTransport, ThresholdRuleRepository, UpdateBroadcaster};
use crate::state_cache::{MergeOutcome, StateCache};
use crate::telemetry_recorder::TelemetryRecorder;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// The address did not parse; nothing was touched.
    Dropped,
    /// The payload was rejected by the merge rules.
    Ignored,
    /// The cache changed. `evaluation` is set for telemetry.
    Applied { evaluation: Option<Evaluation> },
}

/// Entry point for every message the transport delivers.
pub struct Ingestor<R, T, B> {
    namespace: String,
    cache: Arc<StateCache>,
    broadcaster: B,
    recorder: Option<TelemetryRecorder>,
    engine: Arc<AutomationEngine<R, T, B>>,
}

impl<R, T, B> Ingestor<R, T, B>
where
    R: ThresholdRuleRepository,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    pub fn new(
        namespace: impl Into<String>,
        broadcaster: B,
        engine: Arc<AutomationEngine<R, T, B>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            cache: Arc::clone(engine.dispatcher().cache()),
            broadcaster,
            recorder: None,
            engine,
        }
    }

    /// Hand every applied telemetry sample to `recorder`.
    #[must_use]
    pub fn with_recorder(mut self, recorder: TelemetryRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Route and apply one message. Never fails: bad input is logged and
    /// dropped.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Ingested {
        let topic = match Topic::parse(&self.namespace, topic) {
            Ok(topic) => topic,
            Err(err) => {
                tracing::warn!(error = %err, "dropping message on malformed topic");
                return Ingested::Dropped;
            }
        };

        let state = {
            let lock = self.cache.lock(&topic.device_id).await;
            match self.cache.merge_locked(&lock, &topic.kind, payload).await {
                MergeOutcome::Applied(state) => {
                    if let Err(err) = self.broadcaster.publish_state(state.clone()).await {
                        tracing::warn!(device_id = %topic.device_id, error = %err, "failed to broadcast state");
                    }
                    state
                }
                MergeOutcome::Ignored(_) => return Ingested::Ignored,
            }
        };

        if topic.kind != MessageKind::Telemetry {
            return Ingested::Applied { evaluation: None };
        }
        if let Some(recorder) = &self.recorder {
            recorder.record(TelemetryRecord {
                device_id: state.device_id.clone(),
                sensors: state.sensors,
                recorded_at: now(),
            });
        }
        let evaluation = self.engine.evaluate(&state).await;
        Ingested::Applied {
            evaluation: Some(evaluation),
        }
    }
}
