//! # gardenhub-domain
//!
//! Pure domain model for the gardenhub state sync and automation pipeline.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **device state** snapshots and their kind-specific merge rules
//! - Define **topics** (transport addresses) and **commands** (outbound actions)
//! - Define **threshold rules** and **advisories**
//! - Define the **updates** fanned out to observers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod advisory;
pub mod command;
pub mod device;
pub mod device_state;
pub mod event;
pub mod patch;
pub mod telemetry;
pub mod threshold;
pub mod topic;
