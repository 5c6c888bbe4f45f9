//! `SQLite` implementation of [`TelemetrySink`]: an append-only log.

use std::future::Future;

use sqlx::SqlitePool;

use gardenhub_app::ports::TelemetrySink;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::telemetry::TelemetryRecord;

use crate::error::StorageError;

const INSERT: &str = r"
    INSERT INTO telemetry_log (device_id, temperature, air_humidity, light, soil_moisture, recorded_at)
    VALUES (?, ?, ?, ?, ?, ?)
";

/// `SQLite`-backed telemetry history.
pub struct SqliteTelemetrySink {
    pool: SqlitePool,
}

impl SqliteTelemetrySink {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TelemetrySink for SqliteTelemetrySink {
    fn record(
        &self,
        record: TelemetryRecord,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let sensors = record.sensors;
            sqlx::query(INSERT)
                .bind(record.device_id.as_str())
                .bind(sensors.temperature)
                .bind(sensors.air_humidity)
                .bind(sensors.light)
                .bind(sensors.soil_moisture)
                .bind(record.recorded_at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
