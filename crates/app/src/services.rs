//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod chat_service;
pub mod command_service;
pub mod device_service;
pub mod threshold_service;
