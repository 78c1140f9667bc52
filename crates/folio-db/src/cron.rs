//! Read-only probes against the pg_cron scheduling extension.
//!
//! pg_cron is optional: its absence is a normal deployment shape, not an
//! error. These probes answer "is the extension installed" and "does the
//! daily refresh job exist" without ever constructing or mutating jobs.
//! Every query carries a bounded timeout so a wedged database cannot stall
//! the scheduled tick indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::time::timeout;

use folio_core::{defaults, CronJobDescriptor, CronScheduler, Error, Result};

/// PostgreSQL implementation of [`CronScheduler`].
#[derive(Clone)]
pub struct PgCronScheduler {
    pool: PgPool,
    probe_timeout: Duration,
}

impl PgCronScheduler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            probe_timeout: Duration::from_secs(defaults::PROBE_TIMEOUT_SECS),
        }
    }

    /// Override the probe timeout (tests use a short one).
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

#[async_trait]
impl CronScheduler for PgCronScheduler {
    async fn extension_installed(&self) -> Result<bool> {
        let query = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pg_extension WHERE extname = 'pg_cron')",
        )
        .fetch_one(&self.pool);

        match timeout(self.probe_timeout, query).await {
            Ok(result) => result.map_err(Error::Database),
            Err(_) => Err(Error::Internal(format!(
                "pg_cron availability probe timed out after {:?}",
                self.probe_timeout
            ))),
        }
    }

    async fn find_job(&self, job_name: &str) -> Result<Option<CronJobDescriptor>> {
        let query = sqlx::query(
            "SELECT jobname, schedule, command, active FROM cron.job WHERE jobname = $1",
        )
        .bind(job_name)
        .fetch_optional(&self.pool);

        let row = match timeout(self.probe_timeout, query).await {
            Ok(result) => result.map_err(Error::Database)?,
            Err(_) => {
                return Err(Error::Internal(format!(
                    "cron.job probe timed out after {:?}",
                    self.probe_timeout
                )))
            }
        };

        Ok(row.map(|row| CronJobDescriptor {
            job_name: row.get("jobname"),
            schedule: row.get("schedule"),
            command: row.get("command"),
            active: row.get("active"),
        }))
    }
}
