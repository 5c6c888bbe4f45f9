//! Automation engine: threshold watering with a per-device IDLE/PUMPING
//! state machine.
//!
//! A device goes PUMPING when a telemetry sample is below its rule's
//! threshold, and back to IDLE only when the one-shot timer armed at that
//! moment fires. While PUMPING, further dry samples change nothing.
//!
//! The in-memory pump guard is ORed with the cached `pumpState`, so a
//! restart that loses the guard still sees a pump reported as running.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use gardenhub_domain::command::CommandRequest;
use gardenhub_domain::device_state::{DeviceState, PumpState};
use gardenhub_domain::id::DeviceId;

use crate::command_dispatcher::CommandDispatcher;
use crate::ports::{CommandTransport, ThresholdRuleRepository, UpdateBroadcaster};
use crate::state_cache::DeviceLock;

/// What [`AutomationEngine::evaluate`] decided for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// No rule configured (or the rule store failed).
    NoRule,
    /// The rule exists but is switched off.
    Inactive,
    /// The soil is wet enough.
    AboveThreshold,
    /// Already PUMPING; nothing re-triggered.
    AlreadyPumping,
    /// Pump switched ON and the stop timer armed.
    Activated,
    /// The ON command was rejected before publishing; nothing armed.
    DispatchFailed,
}

struct PumpGuard {
    generation: u64,
    timer: AbortHandle,
}

type Guards = Arc<Mutex<HashMap<DeviceId, PumpGuard>>>;

/// Per-device threshold automation.
///
/// Every guard mutation happens while the device lock is held.
pub struct AutomationEngine<R, T, B> {
    rules: R,
    dispatcher: Arc<CommandDispatcher<T, B>>,
    guards: Guards,
    generation: AtomicU64,
}

impl<R, T, B> AutomationEngine<R, T, B>
where
    R: ThresholdRuleRepository,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    /// Create a new engine.
    pub fn new(rules: R, dispatcher: Arc<CommandDispatcher<T, B>>) -> Self {
        Self {
            rules,
            dispatcher,
            guards: Arc::default(),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<T, B>> {
        &self.dispatcher
    }

    /// Whether an automatic stop is pending for the device.
    pub async fn is_pumping(&self, device_id: &DeviceId) -> bool {
        self.guards.lock().await.contains_key(device_id)
    }

    /// Evaluate a freshly merged telemetry snapshot.
    ///
    /// Must be called without holding the device lock; the engine takes it.
    #[tracing::instrument(skip(self, state), fields(device_id = %state.device_id))]
    pub async fn evaluate(&self, state: &DeviceState) -> Evaluation {
        let device_id = &state.device_id;
        let rule = match self.rules.get(device_id).await {
            Ok(Some(rule)) => rule,
            Ok(None) => return Evaluation::NoRule,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load threshold rule");
                return Evaluation::NoRule;
            }
        };
        if !rule.active {
            return Evaluation::Inactive;
        }
        if !rule.is_dry(state.sensors.soil_moisture) {
            return Evaluation::AboveThreshold;
        }

        let lock = self.dispatcher.cache().lock(device_id).await;
        let guarded = self.guards.lock().await.contains_key(device_id);
        if guarded || self.dispatcher.cache().get(device_id).await.is_pumping() {
            tracing::debug!("pump already running, not re-triggering");
            return Evaluation::AlreadyPumping;
        }

        let on = CommandRequest::control_pump(
            device_id.clone(),
            PumpState::On,
            Some(rule.max_pump_duration_seconds),
        );
        match self.dispatcher.send_locked(&lock, on).await {
            Ok(_) => {}
            Err(err) if err.is_transport() => {
                // the optimistic ON is cached, so the OFF must still go out
                tracing::warn!(error = %err, "pump ON publish failed, stop timer armed anyway");
            }
            Err(err) => {
                tracing::error!(error = %err, "pump ON command rejected");
                return Evaluation::DispatchFailed;
            }
        }

        self.arm_stop(&lock, rule.pump_duration()).await;
        tracing::info!(
            soil_moisture = state.sensors.soil_moisture,
            min_soil_moisture = rule.min_soil_moisture,
            seconds = rule.max_pump_duration_seconds,
            "soil too dry, pump started"
        );
        Evaluation::Activated
    }

    /// Schedule an automatic OFF for the locked device after `delay`.
    ///
    /// Replaces any stop already pending; the device counts as PUMPING until
    /// the stop fires or is cancelled.
    pub async fn arm_stop(&self, lock: &DeviceLock, delay: Duration) {
        let device_id = lock.device_id().clone();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timer = tokio::spawn(stop_after(
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.guards),
            device_id.clone(),
            generation,
            delay,
        ));
        let guard = PumpGuard {
            generation,
            timer: timer.abort_handle(),
        };
        if let Some(previous) = self.guards.lock().await.insert(device_id, guard) {
            previous.timer.abort();
        }
    }

    /// Drop the pending automatic stop for the locked device.
    ///
    /// Returns `true` when a stop was pending.
    pub async fn cancel_pending(&self, lock: &DeviceLock) -> bool {
        let Some(guard) = self.guards.lock().await.remove(lock.device_id()) else {
            return false;
        };
        guard.timer.abort();
        tracing::info!(device_id = %lock.device_id(), "automatic pump stop cancelled");
        true
    }
}

async fn stop_after<T, B>(
    dispatcher: Arc<CommandDispatcher<T, B>>,
    guards: Guards,
    device_id: DeviceId,
    generation: u64,
    delay: Duration,
) where
    T: CommandTransport + Send + Sync,
    B: UpdateBroadcaster + Send + Sync,
{
    tokio::time::sleep(delay).await;

    let lock = dispatcher.cache().lock(&device_id).await;
    {
        let mut guards = guards.lock().await;
        match guards.get(&device_id) {
            Some(guard) if guard.generation == generation => {
                guards.remove(&device_id);
            }
            _ => {
                tracing::debug!(device_id = %device_id, generation, "stale pump timer ignored");
                return;
            }
        }
    }

    let off = CommandRequest::control_pump(device_id.clone(), PumpState::Off, None);
    match dispatcher.send_locked(&lock, off).await {
        Ok(_) => tracing::info!(device_id = %device_id, "pump run limit reached, pump stopped"),
        Err(err) => tracing::error!(device_id = %device_id, error = %err, "failed to stop pump"),
    }
}
