//! # gardenhub-adapter-advisor-http
//!
//! Advisor adapter: talks to the external decision service over HTTP.
//!
//! ## Responsibilities
//! - Implement the [`Advisor`](gardenhub_app::ports::Advisor) port with a
//!   `POST <url>/chat` round trip
//! - Map the service's `TEXT` / `TOOL_CALL` answers onto domain types
//! - Provide a fixed [`WeatherProvider`](gardenhub_app::ports::WeatherProvider)
//!   until a live weather source is wired in
//!
//! ## Dependency rule
//! Same as other adapters: depends on `gardenhub-app` and `gardenhub-domain`.

mod advisor;
pub mod config;
pub mod error;
mod weather;
mod wire;

pub use advisor::HttpAdvisor;
pub use config::AdvisorConfig;
pub use error::AdvisorError;
pub use weather::FixedWeather;
