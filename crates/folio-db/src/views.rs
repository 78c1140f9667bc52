//! Materialized-view refresh execution.
//!
//! Two strategies, tried by the coordinator in order:
//!
//! 1. `SELECT refresh_active_users_mv()` — the database function, which is
//!    also what the pg_cron job runs when configured.
//! 2. `REFRESH MATERIALIZED VIEW CONCURRENTLY active_users_stats_mv` — the
//!    direct statement, for databases where the function was never created.
//!
//! `CONCURRENTLY` makes the refresh safe to invoke while readers (and a
//! racing second refresh) are active, which is the concurrency guarantee the
//! coordinator relies on.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::time::timeout;
use tracing::debug;

use folio_core::{defaults, Error, Result, ViewRefresher};

/// PostgreSQL implementation of [`ViewRefresher`] for `active_users_stats_mv`.
#[derive(Clone)]
pub struct PgViewRefresher {
    pool: PgPool,
    refresh_timeout: Duration,
}

impl PgViewRefresher {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            refresh_timeout: Duration::from_secs(defaults::REFRESH_TIMEOUT_SECS),
        }
    }

    /// Override the refresh timeout.
    pub fn with_refresh_timeout(mut self, refresh_timeout: Duration) -> Self {
        self.refresh_timeout = refresh_timeout;
        self
    }

    async fn execute_bounded(&self, sql: &str, strategy: &'static str) -> Result<()> {
        let run = sqlx::query(sql).execute(&self.pool);
        match timeout(self.refresh_timeout, run).await {
            Ok(result) => {
                result.map_err(Error::Database)?;
                debug!(
                    subsystem = "db",
                    component = "view_refresher",
                    op = "refresh",
                    strategy,
                    view_name = defaults::ACTIVE_USERS_VIEW,
                    "View refresh statement completed"
                );
                Ok(())
            }
            Err(_) => Err(Error::Refresh(format!(
                "{} refresh timed out after {:?}",
                strategy, self.refresh_timeout
            ))),
        }
    }
}

#[async_trait]
impl ViewRefresher for PgViewRefresher {
    async fn refresh_via_function(&self) -> Result<()> {
        self.execute_bounded("SELECT refresh_active_users_mv()", "function")
            .await
    }

    async fn refresh_direct(&self) -> Result<()> {
        self.execute_bounded(
            "REFRESH MATERIALIZED VIEW CONCURRENTLY active_users_stats_mv",
            "direct",
        )
        .await
    }
}
