//! Refresh audit log repository implementation.
//!
//! The `materialized_view_refresh_log` table is append-only: every refresh
//! attempt (manual or fallback, success or failure) gets exactly one row.
//! Rows are never updated or deleted by the application.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use folio_core::{
    Error, NewRefreshRecord, RefreshKind, RefreshLogRepository, RefreshRecord, RefreshStatistics,
    Result,
};

/// PostgreSQL implementation of [`RefreshLogRepository`].
#[derive(Clone)]
pub struct PgRefreshLogRepository {
    pool: PgPool,
}

impl PgRefreshLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_record_row(row: sqlx::postgres::PgRow) -> RefreshRecord {
        let kind: String = row.get("refresh_kind");
        RefreshRecord {
            id: row.get("id"),
            view_name: row.get("view_name"),
            kind: RefreshKind::from_str_lossy(&kind),
            triggered_at: row.get("triggered_at"),
            duration_ms: row.get("duration_ms"),
            success: row.get("success"),
            error_message: row.get("error_message"),
        }
    }
}

#[async_trait]
impl RefreshLogRepository for PgRefreshLogRepository {
    async fn append(&self, record: NewRefreshRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO materialized_view_refresh_log
                (view_name, refresh_kind, triggered_at, duration_ms, success, error_message)
            VALUES ($1, $2, now(), $3, $4, $5)
            "#,
        )
        .bind(&record.view_name)
        .bind(record.kind.as_str())
        .bind(record.duration_ms)
        .bind(record.success)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "db",
            component = "refresh_log",
            op = "append",
            view_name = %record.view_name,
            kind = %record.kind,
            success = record.success,
            "Appended refresh audit record"
        );
        Ok(())
    }

    async fn statistics(&self, view_name: &str, window: Duration) -> Result<RefreshStatistics> {
        // COALESCE folds NULL durations to 0 so the average is always defined
        // over the full record count.
        let row = sqlx::query(
            r#"
            SELECT COUNT(*)                                            AS refresh_count,
                   MAX(triggered_at)                                   AS last_refresh,
                   COALESCE(AVG(COALESCE(duration_ms, 0)), 0)::float8  AS avg_duration,
                   COUNT(*) FILTER (WHERE success = false)             AS error_count
            FROM materialized_view_refresh_log
            WHERE view_name = $1
              AND triggered_at >= now() - $2::interval
            "#,
        )
        .bind(view_name)
        .bind(format!("{} seconds", window.as_secs()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Statistics(e.to_string()))?;

        Ok(RefreshStatistics {
            refresh_count: row.get("refresh_count"),
            last_refresh: row.get("last_refresh"),
            average_duration_ms: row.get("avg_duration"),
            error_count: row.get("error_count"),
        })
    }

    async fn recent(&self, view_name: &str, limit: i64) -> Result<Vec<RefreshRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, view_name, refresh_kind, triggered_at, duration_ms, success, error_message
            FROM materialized_view_refresh_log
            WHERE view_name = $1
            ORDER BY triggered_at DESC
            LIMIT $2
            "#,
        )
        .bind(view_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::parse_record_row).collect())
    }
}
