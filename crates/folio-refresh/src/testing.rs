//! In-memory fakes for the coordinator's datastore collaborators.
//!
//! Always compiled (not `#[cfg(test)]`) so integration tests in `tests/` and
//! downstream crates can drive the coordinator without a live PostgreSQL.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use folio_core::{
    CronJobDescriptor, CronScheduler, Error, NewRefreshRecord, RefreshLogRepository, RefreshRecord,
    RefreshStatistics, Result, ViewRefresher,
};

fn internal(msg: &str) -> Error {
    Error::Internal(msg.to_string())
}

/// In-memory refresh log.
///
/// `statistics` is computed from the appended records, so tests observe the
/// same aggregate a real log table would produce.
#[derive(Default)]
pub struct MockRefreshLog {
    records: Mutex<Vec<NewRefreshRecord>>,
    fail_append: AtomicBool,
    stats_error: Mutex<Option<String>>,
}

impl MockRefreshLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `append` fail.
    pub fn fail_appends(&self) {
        self.fail_append.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `statistics` call fail with the given message.
    pub fn fail_statistics(&self, msg: &str) {
        *self.stats_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Snapshot of the appended records.
    pub fn records(&self) -> Vec<NewRefreshRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RefreshLogRepository for MockRefreshLog {
    async fn append(&self, record: NewRefreshRecord) -> Result<()> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(internal("append rejected"));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn statistics(&self, view_name: &str, _window: Duration) -> Result<RefreshStatistics> {
        if let Some(msg) = self.stats_error.lock().unwrap().clone() {
            return Err(Error::Statistics(msg));
        }
        let records = self.records.lock().unwrap();
        let matching: Vec<_> = records.iter().filter(|r| r.view_name == view_name).collect();
        let refresh_count = matching.len() as i64;
        let error_count = matching.iter().filter(|r| !r.success).count() as i64;
        let average_duration_ms = if matching.is_empty() {
            0.0
        } else {
            matching.iter().map(|r| r.duration_ms as f64).sum::<f64>() / matching.len() as f64
        };
        Ok(RefreshStatistics {
            refresh_count,
            last_refresh: (!matching.is_empty()).then(Utc::now),
            average_duration_ms,
            error_count,
        })
    }

    async fn recent(&self, view_name: &str, limit: i64) -> Result<Vec<RefreshRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.view_name == view_name)
            .take(limit as usize)
            .enumerate()
            .map(|(i, r)| RefreshRecord {
                id: i as i64 + 1,
                view_name: r.view_name.clone(),
                kind: r.kind,
                triggered_at: Utc::now(),
                duration_ms: Some(r.duration_ms),
                success: r.success,
                error_message: r.error_message.clone(),
            })
            .collect())
    }
}

/// Configurable pg_cron probe answers.
pub struct MockCron {
    installed: std::result::Result<bool, String>,
    job: std::result::Result<Option<CronJobDescriptor>, String>,
}

impl MockCron {
    /// Extension not installed.
    pub fn unavailable() -> Self {
        Self {
            installed: Ok(false),
            job: Ok(None),
        }
    }

    /// Extension installed, no job configured.
    pub fn available_without_job() -> Self {
        Self {
            installed: Ok(true),
            job: Ok(None),
        }
    }

    /// Extension installed with a job in the given activation state.
    pub fn with_job(job_name: &str, active: bool) -> Self {
        Self {
            installed: Ok(true),
            job: Ok(Some(CronJobDescriptor {
                job_name: job_name.to_string(),
                schedule: "0 0 * * *".to_string(),
                command: "SELECT refresh_active_users_mv()".to_string(),
                active,
            })),
        }
    }

    /// Both probes error (unreachable database, missing cron schema).
    pub fn probe_failure() -> Self {
        Self {
            installed: Err("connection refused".to_string()),
            job: Err("relation \"cron.job\" does not exist".to_string()),
        }
    }
}

#[async_trait]
impl CronScheduler for MockCron {
    async fn extension_installed(&self) -> Result<bool> {
        self.installed.clone().map_err(|e| internal(&e))
    }

    async fn find_job(&self, _job_name: &str) -> Result<Option<CronJobDescriptor>> {
        self.job.clone().map_err(|e| internal(&e))
    }
}

/// Scriptable refresh strategies with call counting.
pub struct MockRefresher {
    function_result: std::result::Result<(), String>,
    direct_result: std::result::Result<(), String>,
    function_calls: AtomicUsize,
    direct_calls: AtomicUsize,
}

impl MockRefresher {
    /// Primary strategy succeeds.
    pub fn succeeding() -> Self {
        Self {
            function_result: Ok(()),
            direct_result: Ok(()),
            function_calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
        }
    }

    /// Primary strategy fails, direct statement succeeds.
    pub fn function_fails_direct_succeeds() -> Self {
        Self {
            function_result: Err("function refresh_active_users_mv() does not exist".to_string()),
            direct_result: Ok(()),
            function_calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
        }
    }

    /// Both strategies fail.
    pub fn both_fail() -> Self {
        Self {
            function_result: Err("function refresh_active_users_mv() does not exist".to_string()),
            direct_result: Err("materialized view \"active_users_stats_mv\" does not exist"
                .to_string()),
            function_calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
        }
    }

    pub fn function_calls(&self) -> usize {
        self.function_calls.load(Ordering::SeqCst)
    }

    pub fn direct_calls(&self) -> usize {
        self.direct_calls.load(Ordering::SeqCst)
    }

    /// Total refresh attempts across both strategies.
    pub fn total_calls(&self) -> usize {
        self.function_calls() + self.direct_calls()
    }
}

#[async_trait]
impl ViewRefresher for MockRefresher {
    async fn refresh_via_function(&self) -> Result<()> {
        self.function_calls.fetch_add(1, Ordering::SeqCst);
        self.function_result.clone().map_err(Error::Refresh)
    }

    async fn refresh_direct(&self) -> Result<()> {
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        self.direct_result.clone().map_err(Error::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::RefreshKind;

    fn record(view: &str, duration_ms: i64, success: bool) -> NewRefreshRecord {
        NewRefreshRecord {
            view_name: view.to_string(),
            kind: RefreshKind::Fallback,
            duration_ms,
            success,
            error_message: (!success).then(|| "boom".to_string()),
        }
    }

    #[tokio::test]
    async fn mock_statistics_compute_exact_mean_and_error_count() {
        let log = MockRefreshLog::new();
        log.append(record("v", 10, true)).await.unwrap();
        log.append(record("v", 20, false)).await.unwrap();
        log.append(record("v", 30, true)).await.unwrap();
        log.append(record("other_view", 999, true)).await.unwrap();

        let stats = log.statistics("v", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(stats.refresh_count, 3);
        assert_eq!(stats.error_count, 1);
        assert!((stats.average_duration_ms - 20.0).abs() < f64::EPSILON);
        assert!(stats.last_refresh.is_some());
    }

    #[tokio::test]
    async fn mock_statistics_empty_window_is_all_zeroes() {
        let log = MockRefreshLog::new();
        let stats = log.statistics("v", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(stats.refresh_count, 0);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.average_duration_ms, 0.0);
        assert!(stats.last_refresh.is_none());
    }
}
