//! `SQLite` implementation of [`DeviceRepository`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use gardenhub_app::ports::DeviceRepository;
use gardenhub_domain::device::Device;
use gardenhub_domain::device_state::ControlMode;
use gardenhub_domain::error::{GardenHubError, NotFoundError};
use gardenhub_domain::id::DeviceId;

use crate::error::{StorageError, decode};

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_id: String = row.try_get("device_id")?;
        let name: String = row.try_get("name")?;
        let control_mode: String = row.try_get("control_mode")?;

        Ok(Self(Device {
            device_id: DeviceId::from_str(&device_id).map_err(decode)?,
            name,
            control_mode: ControlMode::from_str(&control_mode).map_err(decode)?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO devices (device_id, name, control_mode) VALUES (?, ?, ?)
    ON CONFLICT(device_id) DO UPDATE SET name = excluded.name, control_mode = excluded.control_mode
";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE device_id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY device_id";
const UPDATE_MODE: &str = "UPDATE devices SET control_mode = ? WHERE device_id = ?";

/// `SQLite`-backed device registry.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, GardenHubError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, GardenHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn upsert(&self, device: Device) -> impl Future<Output = Result<Device, GardenHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT)
                .bind(device.device_id.as_str())
                .bind(&device.name)
                .bind(device.control_mode.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn set_control_mode(
        &self,
        id: &DeviceId,
        mode: ControlMode,
    ) -> impl Future<Output = Result<(), GardenHubError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let result = sqlx::query(UPDATE_MODE)
                .bind(mode.as_str())
                .bind(&id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: "Device",
                    id,
                }
                .into());
            }
            Ok(())
        }
    }
}
