//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Shared database
//!
//! Several monitoring processes may point at the same database file. The
//! conditional alert-event append is a single `INSERT ... SELECT ... WHERE`
//! statement, so SQLite's write serialization makes the compare-and-swap
//! atomic across processes, not just across tasks.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use sqlx::sqlite::SqliteRow;
use tracing::{debug, info, instrument, warn};

use crate::{AlertEvent, AlertKind, Sample};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::StoredAlertEvent;

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for optimal performance (WAL mode, etc.)
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal) // WAL mode for better concurrency
            .synchronous(SqliteSynchronous::Normal) // Balance safety and performance
            .busy_timeout(std::time::Duration::from_secs(30)); // Retry on lock contention

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;

        info!("SQLite backend ready");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    /// Helper to convert timestamp to Unix milliseconds for SQLite
    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    /// Helper to convert Unix milliseconds from SQLite to DateTime
    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Decode one sample row, or explain why it can't be decoded.
    ///
    /// Used by `query_window` to skip corrupt rows individually instead of
    /// failing the whole aggregation.
    fn decode_sample(row: &SqliteRow) -> Result<Sample, String> {
        let target: String = row.try_get("target").map_err(|e| e.to_string())?;
        let timestamp: i64 = row.try_get("timestamp").map_err(|e| e.to_string())?;
        let available: i64 = row.try_get("available").map_err(|e| e.to_string())?;
        let status_code: Option<i64> = row.try_get("status_code").map_err(|e| e.to_string())?;
        let response_time_ms: Option<f64> =
            row.try_get("response_time_ms").map_err(|e| e.to_string())?;

        let status_code = match status_code {
            None => None,
            Some(code) => Some(
                u16::try_from(code).map_err(|_| format!("status code out of range: {code}"))?,
            ),
        };

        Ok(Sample {
            target,
            timestamp: Self::millis_to_timestamp(timestamp),
            available: available != 0,
            status_code,
            response_time_ms,
        })
    }

    fn decode_alert_event(row: &SqliteRow) -> Result<StoredAlertEvent, String> {
        let id: i64 = row.try_get("id").map_err(|e| e.to_string())?;
        let target: String = row.try_get("target").map_err(|e| e.to_string())?;
        let kind: String = row.try_get("kind").map_err(|e| e.to_string())?;
        let availability: f64 = row.try_get("availability").map_err(|e| e.to_string())?;
        let start_date: i64 = row.try_get("start_date").map_err(|e| e.to_string())?;
        let end_date: Option<i64> = row.try_get("end_date").map_err(|e| e.to_string())?;

        Ok(StoredAlertEvent {
            id,
            event: AlertEvent {
                target,
                kind: kind.parse::<AlertKind>()?,
                availability,
                start_date: Self::millis_to_timestamp(start_date),
                end_date: end_date.map(Self::millis_to_timestamp),
            },
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self, sample), fields(target = %sample.target))]
    async fn insert_sample(&self, sample: &Sample) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO samples (target, timestamp, available, status_code, response_time_ms)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sample.target)
        .bind(Self::timestamp_to_millis(&sample.timestamp))
        .bind(sample.available)
        .bind(sample.status_code.map(|code| code as i64))
        .bind(sample.response_time_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self, event), fields(target = %event.target, kind = %event.kind))]
    async fn insert_alert_event(
        &self,
        event: &AlertEvent,
        expected_last_id: Option<i64>,
    ) -> StorageResult<i64> {
        // The WHERE clause makes the append conditional on the caller's view
        // of the event log still being current. SQLite serializes writers,
        // so the comparison and the insert are one atomic step.
        let result = sqlx::query(
            r#"
            INSERT INTO alert_events (target, kind, availability, start_date, end_date)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE COALESCE((SELECT MAX(id) FROM alert_events WHERE target = ?1), -1) = ?6
            "#,
        )
        .bind(&event.target)
        .bind(event.kind.to_string())
        .bind(event.availability)
        .bind(Self::timestamp_to_millis(&event.start_date))
        .bind(event.end_date.as_ref().map(Self::timestamp_to_millis))
        .bind(expected_last_id.unwrap_or(-1))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            warn!("lost alert-event append race for {}", event.target);
            return Err(StorageError::Conflict {
                target: event.target.clone(),
                expected_last_id,
            });
        }

        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self), fields(target = %target))]
    async fn query_window(
        &self,
        target: &str,
        since: DateTime<Utc>,
    ) -> StorageResult<Vec<Sample>> {
        let rows = sqlx::query(
            r#"
            SELECT target, timestamp, available, status_code, response_time_ms
            FROM samples
            WHERE target = ? AND timestamp > ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(target)
        .bind(Self::timestamp_to_millis(&since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        // Corrupt rows are skipped one by one; a skip indicates schema drift
        // or store corruption and is worth surfacing in the logs.
        let mut samples = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for row in &rows {
            match Self::decode_sample(row) {
                Ok(sample) => samples.push(sample),
                Err(reason) => {
                    skipped += 1;
                    warn!("skipping malformed sample row for {target}: {reason}");
                }
            }
        }

        if skipped > 0 {
            warn!("{skipped} malformed sample rows skipped for {target}");
        }

        Ok(samples)
    }

    #[instrument(skip(self), fields(target = %target))]
    async fn query_last_alert_event(
        &self,
        target: &str,
    ) -> StorageResult<Option<StoredAlertEvent>> {
        let row = sqlx::query(
            r#"
            SELECT id, target, kind, availability, start_date, end_date
            FROM alert_events
            WHERE target = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        match row {
            None => Ok(None),
            Some(row) => Self::decode_alert_event(&row)
                .map(Some)
                // A corrupt last event means the state machine cannot know its
                // current state; the caller skips the cycle rather than guess.
                .map_err(StorageError::SerializationError),
        }
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
