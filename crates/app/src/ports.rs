//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod advisor;
pub mod broadcaster;
pub mod storage;
pub mod telemetry;
pub mod transport;

pub use advisor::{Advisor, WeatherProvider};
pub use broadcaster::UpdateBroadcaster;
pub use storage::{DeviceRepository, ThresholdRuleRepository};
pub use telemetry::TelemetrySink;
pub use transport::CommandTransport;
