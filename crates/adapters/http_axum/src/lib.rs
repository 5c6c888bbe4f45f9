//! # gardenhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API over the live device snapshots, the device registry,
//!   threshold rules and manual commands
//! - Stream state changes and advisories to browsers as Server-Sent Events
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `gardenhub-app` (for port traits and services) and `gardenhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
