//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};

use gardenhub_domain::advisory::{
    AdvisorResponse, AdvisoryRequest, CONTROL_DEVICE_TOOL, ToolCall, WeatherContext,
};
use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::{GardenHubError, NotFoundError};
use gardenhub_domain::event::Update;
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::telemetry::TelemetryRecord;
use gardenhub_domain::threshold::ThresholdRule;

use crate::ports::{
    Advisor, CommandTransport, DeviceRepository, TelemetrySink, ThresholdRuleRepository,
    UpdateBroadcaster, WeatherProvider,
};

pub(crate) fn device_id(value: &str) -> DeviceId {
    DeviceId::new(value).unwrap()
}

// ── Spy transport ──────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct SpyTransport {
    published: Mutex<Vec<(String, Value)>>,
    failing: AtomicBool,
}

impl SpyTransport {
    pub(crate) fn failing() -> Self {
        let spy = Self::default();
        spy.failing.store(true, Ordering::SeqCst);
        spy
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn published(&self) -> Vec<(String, Value)> {
        self.published.lock().unwrap().clone()
    }

    /// `payload.state` of every `CONTROL_PUMP` command, in publish order.
    pub(crate) fn pump_states(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, body)| body["action"] == "CONTROL_PUMP")
            .map(|(_, body)| body["payload"]["state"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl CommandTransport for SpyTransport {
    fn publish(
        &self,
        topic: String,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(GardenHubError::transport(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "broker unreachable",
            )))
        } else {
            let body: Value = serde_json::from_slice(&payload).unwrap();
            self.published.lock().unwrap().push((topic, body));
            Ok(())
        };
        async { result }
    }
}

// ── Spy broadcaster ────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct SpyBroadcaster {
    updates: Mutex<Vec<Update>>,
}

impl SpyBroadcaster {
    pub(crate) fn updates(&self) -> Vec<Update> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn advisories(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter_map(|update| match update {
                Update::Advisory(advisory) => Some(advisory.message.clone()),
                Update::DeviceState(_) => None,
            })
            .collect()
    }
}

impl UpdateBroadcaster for SpyBroadcaster {
    fn publish(&self, update: Update) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        self.updates.lock().unwrap().push(update);
        async { Ok(()) }
    }
}

// ── In-memory rule repo ────────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryRuleRepo {
    store: Mutex<HashMap<DeviceId, ThresholdRule>>,
}

impl InMemoryRuleRepo {
    pub(crate) fn with(rules: Vec<ThresholdRule>) -> Self {
        let map = rules.into_iter().map(|r| (r.device_id.clone(), r)).collect();
        Self {
            store: Mutex::new(map),
        }
    }
}

impl ThresholdRuleRepository for InMemoryRuleRepo {
    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<ThresholdRule>, GardenHubError>> + Send {
        let result = self.store.lock().unwrap().get(device_id).cloned();
        async { Ok(result) }
    }

    fn upsert(
        &self,
        rule: ThresholdRule,
    ) -> impl Future<Output = Result<ThresholdRule, GardenHubError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(rule.device_id.clone(), rule.clone());
        async { Ok(rule) }
    }
}

// ── In-memory device repo ──────────────────────────────────────

#[derive(Default)]
pub(crate) struct InMemoryDeviceRepo {
    store: Mutex<HashMap<DeviceId, Device>>,
}

impl InMemoryDeviceRepo {
    pub(crate) fn with(devices: Vec<Device>) -> Self {
        let map = devices
            .into_iter()
            .map(|d| (d.device_id.clone(), d))
            .collect();
        Self {
            store: Mutex::new(map),
        }
    }

    pub(crate) fn mode_of(&self, id: &DeviceId) -> Option<ControlMode> {
        self.store.lock().unwrap().get(id).map(|d| d.control_mode)
    }
}

impl DeviceRepository for InMemoryDeviceRepo {
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, GardenHubError>> + Send {
        let result = self.store.lock().unwrap().get(id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, GardenHubError>> + Send {
        let mut result: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        result.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        async { Ok(result) }
    }

    fn upsert(&self, device: Device) -> impl Future<Output = Result<Device, GardenHubError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(device.device_id.clone(), device.clone());
        async { Ok(device) }
    }

    fn set_control_mode(
        &self,
        id: &DeviceId,
        mode: ControlMode,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        let result = match self.store.lock().unwrap().get_mut(id) {
            Some(device) => {
                device.control_mode = mode;
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()),
        };
        async { result }
    }
}

// ── Spy telemetry sink ─────────────────────────────────────────

#[derive(Default)]
pub(crate) struct SpySink {
    records: Mutex<Vec<TelemetryRecord>>,
}

impl SpySink {
    pub(crate) fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl TelemetrySink for SpySink {
    fn record(
        &self,
        record: TelemetryRecord,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        self.records.lock().unwrap().push(record);
        async { Ok(()) }
    }
}

// ── Scripted advisor and weather ───────────────────────────────

pub(crate) struct ScriptedAdvisor {
    response: Mutex<Option<AdvisorResponse>>,
    pub(crate) requests: Mutex<Vec<AdvisoryRequest>>,
}

impl ScriptedAdvisor {
    pub(crate) fn answering(response: AdvisorResponse) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            requests: Mutex::default(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            response: Mutex::new(None),
            requests: Mutex::default(),
        }
    }
}

impl Advisor for ScriptedAdvisor {
    fn advise(
        &self,
        request: AdvisoryRequest,
    ) -> impl Future<Output = Result<AdvisorResponse, GardenHubError>> + Send {
        self.requests.lock().unwrap().push(request);
        let result = self.response.lock().unwrap().clone().ok_or_else(|| {
            GardenHubError::transport(std::io::Error::other("advisor offline"))
        });
        async { result }
    }
}

pub(crate) struct NoWeather;

impl WeatherProvider for NoWeather {
    fn current(
        &self,
        _location: &str,
    ) -> impl Future<Output = Result<WeatherContext, GardenHubError>> + Send {
        async { Err(GardenHubError::transport(std::io::Error::other("no weather"))) }
    }
}

pub(crate) fn pump_on_call(device: &str) -> AdvisorResponse {
    let Value::Object(arguments) = json!({
        "deviceUid": device,
        "deviceName": "PUMP",
        "turnOn": true,
        "durationMinutes": 5
    }) else {
        unreachable!()
    };
    AdvisorResponse::ToolCall(ToolCall {
        name: CONTROL_DEVICE_TOOL.to_string(),
        arguments,
    })
}
