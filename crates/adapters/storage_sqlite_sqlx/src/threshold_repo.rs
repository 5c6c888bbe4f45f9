//! `SQLite` implementation of [`ThresholdRuleRepository`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use gardenhub_app::ports::ThresholdRuleRepository;
use gardenhub_domain::error::GardenHubError;
use gardenhub_domain::id::DeviceId;
use gardenhub_domain::threshold::ThresholdRule;

use crate::error::{StorageError, decode};

struct Wrapper(ThresholdRule);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_id: String = row.try_get("device_id")?;
        let seconds: i64 = row.try_get("max_pump_duration_seconds")?;

        Ok(Self(ThresholdRule {
            device_id: DeviceId::from_str(&device_id).map_err(decode)?,
            min_soil_moisture: row.try_get("min_soil_moisture")?,
            max_pump_duration_seconds: u64::try_from(seconds).map_err(decode)?,
            active: row.try_get("active")?,
        }))
    }
}

const UPSERT: &str = r"
    INSERT INTO threshold_rules (device_id, min_soil_moisture, max_pump_duration_seconds, active)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(device_id) DO UPDATE SET
        min_soil_moisture = excluded.min_soil_moisture,
        max_pump_duration_seconds = excluded.max_pump_duration_seconds,
        active = excluded.active
";
const SELECT_BY_DEVICE: &str = "SELECT * FROM threshold_rules WHERE device_id = ?";

/// `SQLite`-backed threshold rule store.
pub struct SqliteThresholdRuleRepository {
    pool: SqlitePool,
}

impl SqliteThresholdRuleRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ThresholdRuleRepository for SqliteThresholdRuleRepository {
    fn get(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<ThresholdRule>, GardenHubError>> + Send {
        let pool = self.pool.clone();
        let device_id = device_id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
                .bind(device_id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn upsert(
        &self,
        rule: ThresholdRule,
    ) -> impl Future<Output = Result<ThresholdRule, GardenHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            // SQLite integers are signed; durations that large are meaningless anyway
            let seconds = i64::try_from(rule.max_pump_duration_seconds).unwrap_or(i64::MAX);
            sqlx::query(UPSERT)
                .bind(rule.device_id.as_str())
                .bind(rule.min_soil_moisture)
                .bind(seconds)
                .bind(rule.active)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rule)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::memory;

    async fn setup() -> SqliteThresholdRuleRepository {
        SqliteThresholdRuleRepository::new(memory().await.pool().clone())
    }

    fn rule(min: f64, seconds: u64, active: bool) -> ThresholdRule {
        ThresholdRule {
            device_id: DeviceId::new("g1").unwrap(),
            min_soil_moisture: min,
            max_pump_duration_seconds: seconds,
            active,
        }
    }

    #[tokio::test]
    async fn should_return_none_when_no_rule_configured() {
        let repo = setup().await;
        assert!(repo.get(&DeviceId::new("g1").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_store_and_load_rule() {
        let repo = setup().await;

        repo.upsert(rule(30.0, 15, true)).await.unwrap();

        let loaded = repo.get(&DeviceId::new("g1").unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, rule(30.0, 15, true));
    }

    #[tokio::test]
    async fn should_replace_rule_on_second_upsert() {
        let repo = setup().await;
        repo.upsert(rule(30.0, 15, true)).await.unwrap();

        repo.upsert(rule(45.5, 60, false)).await.unwrap();

        let loaded = repo.get(&DeviceId::new("g1").unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, rule(45.5, 60, false));
    }
}
