//! In-memory ports for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gardenhub_app::automation_engine::AutomationEngine;
use gardenhub_app::broadcaster::InProcessBroadcaster;
use gardenhub_app::command_dispatcher::CommandDispatcher;
use gardenhub_app::ports::{
    Advisor, CommandTransport, DeviceRepository, ThresholdRuleRepository, WeatherProvider,
};
use gardenhub_app::services::chat_service::{ChatConfig, ChatService};
use gardenhub_app::services::command_service::CommandService;
use gardenhub_app::services::device_service::DeviceService;
use gardenhub_app::services::threshold_service::ThresholdService;
use gardenhub_app::state_cache::StateCache;
use gardenhub_domain::advisory::{AdvisorResponse, AdvisoryRequest, WeatherContext};
use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::{GardenHubError, NotFoundError};
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::threshold::ThresholdRule;

use crate::state::AppState;

#[derive(Default)]
pub(crate) struct MemoryDevices(Mutex<HashMap<DeviceId, Device>>);

impl MemoryDevices {
    pub(crate) fn insert(&self, device: Device) {
        self.0.lock().unwrap().insert(device.device_id.clone(), device);
    }
}

impl DeviceRepository for MemoryDevices {
    async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, GardenHubError> {
        Ok(self.0.lock().unwrap().get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Device>, GardenHubError> {
        let mut all: Vec<_> = self.0.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(all)
    }

    async fn upsert(&self, device: Device) -> Result<Device, GardenHubError> {
        self.insert(device.clone());
        Ok(device)
    }

    async fn set_control_mode(&self, id: &DeviceId, mode: ControlMode) -> Result<(), GardenHubError> {
        match self.0.lock().unwrap().get_mut(id) {
            Some(device) => {
                device.control_mode = mode;
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()),
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryRules(Mutex<HashMap<DeviceId, ThresholdRule>>);

impl ThresholdRuleRepository for MemoryRules {
    async fn get(&self, device_id: &DeviceId) -> Result<Option<ThresholdRule>, GardenHubError> {
        Ok(self.0.lock().unwrap().get(device_id).cloned())
    }

    async fn upsert(&self, rule: ThresholdRule) -> Result<ThresholdRule, GardenHubError> {
        self.0
            .lock()
            .unwrap()
            .insert(rule.device_id.clone(), rule.clone());
        Ok(rule)
    }
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    topics: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl RecordingTransport {
    pub(crate) fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl CommandTransport for RecordingTransport {
    async fn publish(&self, topic: String, _payload: Vec<u8>) -> Result<(), GardenHubError> {
        if *self.failing.lock().unwrap() {
            return Err(GardenHubError::transport(std::io::Error::other("broker down")));
        }
        self.topics.lock().unwrap().push(topic);
        Ok(())
    }
}

/// Answers every question with the scripted response; fails when unset.
#[derive(Default)]
pub(crate) struct ScriptedAdvisor {
    response: Mutex<Option<AdvisorResponse>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub(crate) fn answer(&self, response: AdvisorResponse) {
        *self.response.lock().unwrap() = Some(response);
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Advisor for ScriptedAdvisor {
    async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisorResponse, GardenHubError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let response = self.response.lock().unwrap().clone();
        response.ok_or_else(|| GardenHubError::transport(std::io::Error::other("advisor offline")))
    }
}

pub(crate) struct UnknownWeather;

impl WeatherProvider for UnknownWeather {
    async fn current(&self, location: &str) -> Result<WeatherContext, GardenHubError> {
        Ok(WeatherContext::unknown(location))
    }
}

pub(crate) type TestState = AppState<
    Arc<MemoryDevices>,
    Arc<MemoryRules>,
    Arc<RecordingTransport>,
    Arc<InProcessBroadcaster>,
    Arc<ScriptedAdvisor>,
    UnknownWeather,
>;

pub(crate) struct Fixture {
    pub(crate) state: TestState,
    pub(crate) devices: Arc<MemoryDevices>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) advisor: Arc<ScriptedAdvisor>,
}

/// State over in-memory ports with `g1` registered in `AUTO` mode.

pub(crate) fn fixture() -> Fixture {
    let devices = Arc::new(MemoryDevices::default());
    devices.insert(
        Device::builder()
            .device_id(DeviceId::new("g1").unwrap())
            .name("Herb box")
            .control_mode(ControlMode::Auto)
            .build()
            .unwrap(),
    );
    let rules = Arc::new(MemoryRules::default());
    let transport = Arc::new(RecordingTransport::default());
    let updates = Arc::new(InProcessBroadcaster::new(16));

    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(StateCache::new()),
        Arc::clone(&transport),
        Arc::clone(&updates),
        "smartgarden",
    ));
    let engine = Arc::new(AutomationEngine::new(Arc::clone(&rules), dispatcher));
    let commands = Arc::new(CommandService::new(Arc::clone(&devices), engine));
    let advisor = Arc::new(ScriptedAdvisor::default());
    let chat = Arc::new(ChatService::new(
        Arc::clone(&advisor),
        UnknownWeather,
        Arc::clone(&devices),
        Arc::clone(&commands),
        Arc::clone(&updates),
        ChatConfig::default(),
    ));

    let state = AppState::new(
        DeviceService::new(Arc::clone(&devices)),
        ThresholdService::new(rules),
        commands,
        chat,
        updates,
    );
    Fixture {
        state,
        devices,
        transport,
        advisor,
    }
}
