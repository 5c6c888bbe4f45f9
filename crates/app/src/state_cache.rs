//! State cache: the authoritative in-memory view of every device.
//!
//! Writers for one device are serialized through a per-device lock obtained
//! with [`StateCache::lock`]; the snapshot map itself is only held for the
//! instant it takes to read or replace one entry, so readers never wait on a
//! device lock and devices never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use gardenhub_domain::device_state::{DeviceState, StatusReport};
use gardenhub_domain::error::MalformedInputError;
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::patch::StatePatch;
use gardenhub_domain::time::now;
use gardenhub_domain::topic::MessageKind;

/// Exclusive right to mutate one device's snapshot.
///
/// Dropping the guard releases the lock.
pub struct DeviceLock {
    device_id: DeviceId,
    _guard: OwnedMutexGuard<()>,
}

impl DeviceLock {
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

impl std::fmt::Debug for DeviceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLock")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The payload was applied; holds the new snapshot.
    Applied(DeviceState),
    /// The payload was dropped; holds the unchanged snapshot.
    Ignored(DeviceState),
}

impl MergeOutcome {
    #[must_use]
    pub fn state(&self) -> &DeviceState {
        match self {
            Self::Applied(state) | Self::Ignored(state) => state,
        }
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Keyed store of the latest [`DeviceState`] per device.
#[derive(Default)]
pub struct StateCache {
    states: RwLock<HashMap<DeviceId, DeviceState>>,
    locks: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl StateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the per-device lock, waiting for any current holder.
    pub async fn lock(&self, device_id: &DeviceId) -> DeviceLock {
        let mutex = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(device_id.clone()).or_default())
        };
        DeviceLock {
            device_id: device_id.clone(),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Current snapshot, or the offline default for an unknown device.
    ///
    /// The default is synthesized on the fly and never stored.
    pub async fn get(&self, device_id: &DeviceId) -> DeviceState {
        self.states
            .read()
            .await
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| DeviceState::offline(device_id.clone()))
    }

    /// All cached snapshots, ordered by device id.
    pub async fn snapshot(&self) -> Vec<DeviceState> {
        let mut states: Vec<_> = self.states.read().await.values().cloned().collect();
        states.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        states
    }

    /// Replace the snapshot of the locked device.
    pub(crate) async fn store(&self, lock: &DeviceLock, state: DeviceState) {
        debug_assert_eq!(lock.device_id(), &state.device_id);
        self.states
            .write()
            .await
            .insert(lock.device_id().clone(), state);
    }

    /// Lock the device, merge the payload, release.
    pub async fn merge(&self, device_id: &DeviceId, kind: &MessageKind, payload: &[u8]) -> MergeOutcome {
        let lock = self.lock(device_id).await;
        self.merge_locked(&lock, kind, payload).await
    }

    /// Apply an inbound payload of the given kind to the locked device.
    ///
    /// Malformed payloads and unknown kinds are logged and leave the snapshot
    /// untouched.
    #[tracing::instrument(skip(self, lock, payload), fields(device_id = %lock.device_id(), kind = %kind))]
    pub async fn merge_locked(&self, lock: &DeviceLock, kind: &MessageKind, payload: &[u8]) -> MergeOutcome {
        let current = self.get(lock.device_id()).await;
        let merged = match kind {
            MessageKind::Telemetry => current.with_telemetry(payload, now()),
            MessageKind::Status => {
                let report = StatusReport::parse(payload);
                if let StatusReport::Unrecognised(raw) = &report {
                    tracing::warn!(status = %raw, "unrecognised status value, connectivity unchanged");
                }
                Ok(current.with_status(&report, now()))
            }
            MessageKind::State => StatePatch::from_slice(payload).map(|patch| current.with_state(patch, now())),
            MessageKind::Other(other) => Err(MalformedInputError::UnknownKind(other.clone())),
        };

        match merged {
            Ok(next) => {
                self.store(lock, next.clone()).await;
                tracing::debug!("merged device message");
                MergeOutcome::Applied(next)
            }
            Err(err) => {
                tracing::warn!(error = %err, "dropping device message");
                MergeOutcome::Ignored(current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::device_id;
    use gardenhub_domain::device_state::{Connectivity, ControlMode, PumpState};
    use std::time::Duration;

    const TELEMETRY: &[u8] =
        br#"{"sensors":{"temperature":22.5,"airHumidity":41,"light":800,"soilMoisture":37}}"#;

    #[tokio::test]
    async fn should_return_default_without_storing_it() {
        let cache = StateCache::new();
        let state = cache.get(&device_id("g1")).await;

        assert_eq!(state.status, Connectivity::Offline);
        assert!(cache.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn should_apply_telemetry_and_set_last_seen() {
        let cache = StateCache::new();
        let outcome = cache.merge(&device_id("g1"), &MessageKind::Telemetry, TELEMETRY).await;

        assert!(outcome.is_applied());
        let state = cache.get(&device_id("g1")).await;
        assert!((state.sensors.soil_moisture - 37.0).abs() < f64::EPSILON);
        assert!(state.last_seen.is_some());
    }

    #[tokio::test]
    async fn should_leave_sensors_unchanged_when_telemetry_lacks_sensors() {
        let cache = StateCache::new();
        let id = device_id("g1");
        cache.merge(&id, &MessageKind::Telemetry, TELEMETRY).await;
        let before = cache.get(&id).await;

        let outcome = cache.merge(&id, &MessageKind::Telemetry, br#"{"temp":1}"#).await;

        assert!(!outcome.is_applied());
        assert_eq!(cache.get(&id).await, before);
    }

    #[tokio::test]
    async fn should_only_change_control_mode_when_state_carries_control_mode() {
        let cache = StateCache::new();
        let id = device_id("g1");
        cache.merge(&id, &MessageKind::Telemetry, TELEMETRY).await;
        cache.merge(&id, &MessageKind::State, br#"{"pumpState":"ON"}"#).await;
        let before = cache.get(&id).await;

        cache.merge(&id, &MessageKind::State, br#"{"controlMode":"AUTO"}"#).await;

        let after = cache.get(&id).await;
        assert_eq!(after.control_mode, ControlMode::Auto);
        assert_eq!(after.pump_state, PumpState::On);
        assert_eq!(after.sensors, before.sensors);
    }

    #[tokio::test]
    async fn should_accept_raw_and_structured_status() {
        let cache = StateCache::new();
        let id = device_id("g1");

        cache.merge(&id, &MessageKind::Status, b"ONLINE").await;
        assert_eq!(cache.get(&id).await.status, Connectivity::Online);

        cache.merge(&id, &MessageKind::Status, br#"{"status":"OFFLINE"}"#).await;
        assert_eq!(cache.get(&id).await.status, Connectivity::Offline);
    }

    #[tokio::test]
    async fn should_refresh_last_seen_when_status_is_unrecognised() {
        let cache = StateCache::new();
        let id = device_id("g1");

        let outcome = cache.merge(&id, &MessageKind::Status, b"booting").await;

        assert!(outcome.is_applied());
        let state = cache.get(&id).await;
        assert_eq!(state.status, Connectivity::Offline);
        assert!(state.last_seen.is_some());
    }

    #[tokio::test]
    async fn should_ignore_unknown_kind() {
        let cache = StateCache::new();
        let outcome = cache
            .merge(&device_id("g1"), &MessageKind::Other("ota".to_string()), b"{}")
            .await;

        assert!(!outcome.is_applied());
        assert!(cache.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn should_not_apply_half_of_an_ill_typed_state_patch() {
        let cache = StateCache::new();
        let id = device_id("g1");

        cache
            .merge(&id, &MessageKind::State, br#"{"controlMode":"AUTO","pumpState":42}"#)
            .await;

        assert_eq!(cache.get(&id).await.control_mode, ControlMode::Manual);
    }

    #[tokio::test]
    async fn should_keep_last_seen_non_decreasing_across_merges() {
        let cache = StateCache::new();
        let id = device_id("g1");
        let mut previous = None;

        let messages: [(MessageKind, &[u8]); 4] = [
            (MessageKind::Telemetry, TELEMETRY),
            (MessageKind::Status, b"ONLINE"),
            (MessageKind::State, br#"{"pumpState":"OFF"}"#),
            (MessageKind::Telemetry, TELEMETRY),
        ];
        for (kind, payload) in &messages {
            let outcome = cache.merge(&id, kind, payload).await;
            let seen = outcome.state().last_seen;
            assert!(seen >= previous);
            previous = seen;
        }
    }

    #[tokio::test]
    async fn should_list_snapshots_ordered_by_device_id() {
        let cache = StateCache::new();
        cache.merge(&device_id("b"), &MessageKind::Status, b"ONLINE").await;
        cache.merge(&device_id("a"), &MessageKind::Status, b"ONLINE").await;

        let ids: Vec<_> = cache
            .snapshot()
            .await
            .into_iter()
            .map(|s| s.device_id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn should_not_block_other_devices_while_one_is_locked() {
        let cache = StateCache::new();
        let _held = cache.lock(&device_id("a")).await;

        let other = tokio::time::timeout(Duration::from_secs(1), cache.lock(&device_id("b"))).await;
        assert!(other.is_ok());

        let read = tokio::time::timeout(Duration::from_secs(1), cache.get(&device_id("a"))).await;
        assert!(read.is_ok());
    }

    #[tokio::test]
    async fn should_serialize_lockers_of_the_same_device() {
        let cache = StateCache::new();
        let _held = cache.lock(&device_id("a")).await;

        let same = tokio::time::timeout(Duration::from_millis(50), cache.lock(&device_id("a"))).await;
        assert!(same.is_err());
    }
}
