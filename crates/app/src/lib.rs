//! # gardenhub-app
//!
//! Application layer: the state sync and automation pipeline plus the
//! **port definitions** (traits) it needs from the outside world.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CommandTransport`: publish encoded commands to devices
//!   - `UpdateBroadcaster`: fan out state changes and advisories
//!   - `TelemetrySink`: append sensor samples to history
//!   - `DeviceRepository` / `ThresholdRuleRepository`: registry and rule store
//!   - `Advisor` / `WeatherProvider`: the external decision service and its context
//! - Run the pipeline:
//!   - `StateCache`: per-device merge with per-device locking
//!   - `Ingestor`: route → merge → broadcast → persist → evaluate
//!   - `CommandDispatcher`: optimistic update, then publish
//!   - `AutomationEngine`: threshold watering with one-shot stop timers
//!   - `AdvisoryJob`: periodic, mode-gated advisor consultation
//!   - `ChatService`: on-demand advisor questions from a person
//! - Provide **in-process infrastructure** (broadcaster, telemetry queue)
//!
//! ## Dependency rule
//! Depends on `gardenhub-domain` only (plus `tokio` for locks, channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod advisory_job;
pub mod automation_engine;
pub mod broadcaster;
pub mod command_dispatcher;
pub mod ingest;
pub mod ports;
pub mod services;
pub mod state_cache;
pub mod telemetry_recorder;

#[cfg(test)]
pub(crate) mod testing;
