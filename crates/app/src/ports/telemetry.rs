//! Telemetry sink port: write-only history of sensor samples.

use std::future::Future;

use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::telemetry::TelemetryRecord;

/// Durable store for sensor samples.
pub trait TelemetrySink {
    /// Append one sample.
    fn record(
        &self,
        record: TelemetryRecord,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send;
}

impl<T: TelemetrySink + Send + Sync> TelemetrySink for std::sync::Arc<T> {
    fn record(
        &self,
        record: TelemetryRecord,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        (**self).record(record)
    }
}
