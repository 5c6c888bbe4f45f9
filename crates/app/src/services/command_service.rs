//! Command service: every command not issued by the threshold engine.
//!
//! Commands are only accepted for registered devices. A pump command from a
//! person (or from the advisor acting on their behalf) wins over automatic
//! watering: the pending automatic stop is dropped before it goes out. An ON
//! with a run time gets its own automatic stop, so the pump is switched off
//! even if the firmware ignores `time`.

use std::sync::Arc;
use std::time::Duration;

use gardenhub_domain::command::{CommandAction, CommandRequest};
use gardenhub_domain::device_state::{DeviceState, PumpState};
use gardenhub_domain::error::{GardenHubError, NotFoundError};

use crate::automation_engine::AutomationEngine;
use crate::ports::{CommandTransport, DeviceRepository, ThresholdRuleRepository, UpdateBroadcaster};
use crate::state_cache::StateCache;

/// Application service for manual and advisory commands.
pub struct CommandService<D, R, T, B> {
    devices: D,
    engine: Arc<AutomationEngine<R, T, B>>,
}

impl<D, R, T, B> CommandService<D, R, T, B>
where
    D: DeviceRepository,
    R: ThresholdRuleRepository,
    T: CommandTransport + Send + Sync + 'static,
    B: UpdateBroadcaster + Send + Sync + 'static,
{
    /// Create a new service writing mode changes through to `devices`.
    pub fn new(devices: D, engine: Arc<AutomationEngine<R, T, B>>) -> Self {
        Self { devices, engine }
    }

    /// The cache commands are folded into.
    #[must_use]
    pub fn cache(&self) -> &Arc<StateCache> {
        self.engine.dispatcher().cache()
    }

    /// Dispatch a command to a registered device.
    ///
    /// A successful `SET_MODE` is also written to the device registry so the
    /// advisory job sees the new mode.
    ///
    /// # Errors
    ///
    /// Returns [`GardenHubError::Validation`] for an invalid payload and
    /// [`GardenHubError::NotFound`] for a device missing from the registry;
    /// nothing is cancelled or sent in either case. Otherwise returns the
    /// dispatcher's transport/serialization error.
    #[tracing::instrument(skip(self, request), fields(device_id = %request.device_id, action = %request.action))]
    pub async fn send_command(&self, request: CommandRequest) -> Result<DeviceState, GardenHubError> {
        let action = request.interpret()?;
        let device_id = request.device_id.clone();
        if self.devices.get_by_id(&device_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Device",
                id: device_id.to_string(),
            }
            .into());
        }
        let dispatcher = self.engine.dispatcher();

        let lock = dispatcher.cache().lock(&device_id).await;
        if matches!(action, CommandAction::ControlPump { .. }) && self.engine.cancel_pending(&lock).await {
            tracing::info!("manual pump command overrides automatic watering");
        }
        let result = dispatcher.send_locked(&lock, request).await;
        if let CommandAction::ControlPump {
            state: PumpState::On,
            time: Some(seconds),
        } = action
        {
            // the optimistic ON is cached even when the publish failed
            let cached_on = match &result {
                Ok(_) => true,
                Err(err) => err.is_transport(),
            };
            if seconds > 0 && cached_on {
                self.engine.arm_stop(&lock, Duration::from_secs(seconds)).await;
            }
        }
        let state = result?;
        drop(lock);

        let persisted = match action {
            CommandAction::SetMode { mode } => self.devices.set_control_mode(&device_id, mode).await,
            _ => Ok(()),
        };
        if let Err(err) = persisted {
            tracing::error!(error = %err, "failed to persist control mode");
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_dispatcher::CommandDispatcher;
    use crate::testing::{
        InMemoryDeviceRepo, InMemoryRuleRepo, SpyBroadcaster, SpyTransport, device_id,
    };
    use gardenhub_domain::device::Device;
    use gardenhub_domain::device_state::{ControlMode, PumpState, SensorSnapshot};
    use gardenhub_domain::error::ValidationError;
    use gardenhub_domain::threshold::ThresholdRule;
    use serde_json::{Value, json};
    use std::time::Duration;

    type Service = CommandService<
        Arc<InMemoryDeviceRepo>,
        InMemoryRuleRepo,
        Arc<SpyTransport>,
        Arc<SpyBroadcaster>,
    >;

    struct Harness {
        service: Service,
        engine: Arc<AutomationEngine<InMemoryRuleRepo, Arc<SpyTransport>, Arc<SpyBroadcaster>>>,
        devices: Arc<InMemoryDeviceRepo>,
        transport: Arc<SpyTransport>,
    }

    fn harness() -> Harness {
        let transport = Arc::new(SpyTransport::default());
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::new(StateCache::new()),
            Arc::clone(&transport),
            Arc::new(SpyBroadcaster::default()),
            "smartgarden",
        ));
        let rules = InMemoryRuleRepo::with(vec![ThresholdRule {
            device_id: device_id("g1"),
            min_soil_moisture: 30.0,
            max_pump_duration_seconds: 10,
            active: true,
        }]);
        let engine = Arc::new(AutomationEngine::new(rules, dispatcher));
        let devices = Arc::new(InMemoryDeviceRepo::with(vec![
            Device::builder()
                .device_id(device_id("g1"))
                .name("Raised bed")
                .build()
                .unwrap(),
        ]));
        Harness {
            service: CommandService::new(Arc::clone(&devices), Arc::clone(&engine)),
            engine,
            devices,
            transport,
        }
    }

    fn dry(id: &str) -> DeviceState {
        let mut state = DeviceState::offline(device_id(id));
        state.sensors = SensorSnapshot {
            soil_moisture: 5.0,
            ..SensorSnapshot::default()
        };
        state
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_automatic_stop_when_manual_command_arrives() {
        let h = harness();
        h.engine.evaluate(&dry("g1")).await;

        h.service
            .send_command(CommandRequest::control_pump(device_id("g1"), PumpState::On, None))
            .await
            .unwrap();
        assert!(!h.engine.is_pumping(&device_id("g1")).await);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON", "ON"]);
    }

    #[tokio::test]
    async fn should_write_mode_through_to_registry() {
        let h = harness();

        let state = h
            .service
            .send_command(CommandRequest::set_mode(device_id("g1"), ControlMode::Auto))
            .await
            .unwrap();

        assert_eq!(state.control_mode, ControlMode::Auto);
        assert_eq!(h.devices.mode_of(&device_id("g1")), Some(ControlMode::Auto));
    }

    #[tokio::test]
    async fn should_reject_command_for_unregistered_device() {
        let h = harness();

        let result = h
            .service
            .send_command(CommandRequest::control_pump(device_id("ghost"), PumpState::On, None))
            .await;

        assert!(matches!(result, Err(GardenHubError::NotFound(ref e)) if e.id == "ghost"));
        assert!(h.transport.published().is_empty());
        assert_eq!(
            h.service.cache().get(&device_id("ghost")).await.pump_state,
            PumpState::Off
        );
        assert!(h.service.cache().snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_automatic_stop_when_mode_changes() {
        let h = harness();
        h.engine.evaluate(&dry("g1")).await;

        h.service
            .send_command(CommandRequest::set_mode(device_id("g1"), ControlMode::Auto))
            .await
            .unwrap();
        assert!(h.engine.is_pumping(&device_id("g1")).await);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON", "OFF"]);
        assert!(!h.engine.is_pumping(&device_id("g1")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_pump_after_requested_run_time() {
        let h = harness();

        h.service
            .send_command(CommandRequest::control_pump(device_id("g1"), PumpState::On, Some(120)))
            .await
            .unwrap();
        assert!(h.engine.is_pumping(&device_id("g1")).await);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON"]);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON", "OFF"]);
        let cached = h.service.cache().get(&device_id("g1")).await;
        assert_eq!(cached.pump_state, PumpState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_schedule_stop_for_open_ended_pump_command() {
        let h = harness();

        h.service
            .send_command(CommandRequest::control_pump(device_id("g1"), PumpState::On, None))
            .await
            .unwrap();

        assert!(!h.engine.is_pumping(&device_id("g1")).await);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_automatic_stop_when_command_is_invalid() {
        let h = harness();
        h.engine.evaluate(&dry("g1")).await;

        let Value::Object(payload) = json!({"state": "SIDEWAYS"}) else {
            unreachable!()
        };
        let bad = CommandRequest::new(device_id("g1"), "CONTROL_PUMP", payload).unwrap();
        let result = h.service.send_command(bad).await;

        assert!(matches!(
            result,
            Err(GardenHubError::Validation(ValidationError::UnknownPumpState(_)))
        ));
        assert!(h.engine.is_pumping(&device_id("g1")).await);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(h.transport.pump_states(), vec!["ON", "OFF"]);
    }
}
