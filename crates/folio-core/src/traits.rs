//! Repository and datastore capability traits.
//!
//! The coordinator depends on three narrow datastore capabilities rather than
//! concrete PostgreSQL types, so tests can substitute in-memory fakes and the
//! fail-closed policy lives in one place (the coordinator, not each backend).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CronJobDescriptor, NewRefreshRecord, RefreshRecord, RefreshStatistics};

/// Append-only audit trail of refresh attempts.
#[async_trait]
pub trait RefreshLogRepository: Send + Sync {
    /// Append one record for a completed refresh attempt (success or failure).
    async fn append(&self, record: NewRefreshRecord) -> Result<()>;

    /// Aggregate records for `view_name` within the trailing `window`.
    async fn statistics(&self, view_name: &str, window: Duration) -> Result<RefreshStatistics>;

    /// Most recent records for `view_name`, newest first.
    async fn recent(&self, view_name: &str, limit: i64) -> Result<Vec<RefreshRecord>>;
}

/// Read-only probes against the datastore's optional scheduling extension.
#[async_trait]
pub trait CronScheduler: Send + Sync {
    /// Whether the pg_cron extension is installed.
    ///
    /// Implementations return `Err` on query failure; callers fold that into
    /// "not available".
    async fn extension_installed(&self) -> Result<bool>;

    /// Look up a scheduled job by name. `Ok(None)` means the registry is
    /// readable but holds no such job.
    async fn find_job(&self, job_name: &str) -> Result<Option<CronJobDescriptor>>;
}

/// The view-refresh capability itself.
#[async_trait]
pub trait ViewRefresher: Send + Sync {
    /// Primary strategy: invoke the database refresh function.
    async fn refresh_via_function(&self) -> Result<()>;

    /// Secondary strategy: issue the refresh statement directly.
    async fn refresh_direct(&self) -> Result<()>;
}
