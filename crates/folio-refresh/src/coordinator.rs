//! The refresh coordinator: decides who owns refresh duty and acts on it.
//!
//! Ownership is never cached. Every scheduled tick re-derives the answer from
//! two probes (extension installed, job active), so the coordinator cannot
//! get stuck believing a database job exists after it was dropped out-of-band,
//! and picks up jobs created out-of-band on the next tick.
//!
//! No public operation on this type returns `Err` for a refresh attempt:
//! scheduled runs must never crash the host process, and administrative
//! callers always receive a structured report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use folio_core::{
    defaults, CronJobStatus, CronScheduler, Error, EvaluateOutcome, HealthStatus, NewRefreshRecord,
    RefreshKind, RefreshLogRepository, RefreshRecord, RefreshReport, RefreshStatistics, Result,
    SchedulerAction, ViewHealth, ViewRefresher,
};

/// Coordinates refreshes of a single materialized view.
pub struct RefreshCoordinator {
    view_name: String,
    job_name: String,
    log: Arc<dyn RefreshLogRepository>,
    cron: Arc<dyn CronScheduler>,
    refresher: Arc<dyn ViewRefresher>,
    /// Guards the refresh critical section so a manual refresh and a
    /// scheduled tick cannot drive two refresh statements at once from this
    /// process. The statement itself is also concurrency-safe
    /// (CONCURRENTLY), this just avoids pointless duplicate work.
    refresh_lock: Mutex<()>,
}

impl RefreshCoordinator {
    /// Create a coordinator for the active-users statistics view.
    pub fn new(
        log: Arc<dyn RefreshLogRepository>,
        cron: Arc<dyn CronScheduler>,
        refresher: Arc<dyn ViewRefresher>,
    ) -> Self {
        Self {
            view_name: defaults::ACTIVE_USERS_VIEW.to_string(),
            job_name: defaults::DAILY_REFRESH_JOB.to_string(),
            log,
            cron,
            refresher,
            refresh_lock: Mutex::new(()),
        }
    }

    /// The materialized view this coordinator keeps fresh.
    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    /// The database-level job name probed for external ownership.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Scheduled tick: refresh only if no database-level job owns the duty.
    ///
    /// Never returns an error; failures are logged and recorded in the audit
    /// trail. When the tick is skipped because the external job is active, no
    /// audit record is written.
    pub async fn evaluate_and_refresh(&self) -> EvaluateOutcome {
        if self.is_scheduler_available().await {
            let status = self.job_status().await;
            if status.job_exists && status.active {
                debug!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "evaluate",
                    view_name = %self.view_name,
                    job_name = %self.job_name,
                    "Daily database job is active, skipping application-level refresh"
                );
                return EvaluateOutcome::SkippedExternallyManaged;
            }
        }

        info!(
            subsystem = "refresh",
            component = "coordinator",
            op = "evaluate",
            view_name = %self.view_name,
            "Daily database job not active, using application-level refresh"
        );
        EvaluateOutcome::Refreshed(self.perform_refresh(RefreshKind::Fallback).await)
    }

    /// Administrative unconditional refresh.
    ///
    /// Ignores external job ownership, measures wall-clock duration, and
    /// always appends exactly one MANUAL audit record.
    pub async fn force_refresh(&self) -> RefreshReport {
        info!(
            subsystem = "refresh",
            component = "coordinator",
            op = "force_refresh",
            view_name = %self.view_name,
            "Force refresh requested"
        );
        self.perform_refresh(RefreshKind::Manual).await
    }

    /// Aggregate refresh statistics over the default 24-hour window.
    pub async fn refresh_statistics(&self) -> Result<RefreshStatistics> {
        self.refresh_statistics_within(Duration::from_secs(
            defaults::STATS_WINDOW_HOURS as u64 * 3600,
        ))
        .await
    }

    /// Aggregate refresh statistics over an explicit trailing window.
    pub async fn refresh_statistics_within(&self, window: Duration) -> Result<RefreshStatistics> {
        self.log.statistics(&self.view_name, window).await
    }

    /// Most recent audit-log rows for this view, newest first.
    pub async fn recent_refreshes(&self, limit: i64) -> Result<Vec<RefreshRecord>> {
        self.log.recent(&self.view_name, limit).await
    }

    /// Whether the pg_cron extension is installed.
    ///
    /// Probe failure is a normal negative answer, not an error: absence of
    /// the extension is an expected deployment shape.
    pub async fn is_scheduler_available(&self) -> bool {
        match self.cron.extension_installed().await {
            Ok(installed) => installed,
            Err(e) => {
                debug!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "probe",
                    "Cannot check pg_cron availability: {}",
                    e
                );
                false
            }
        }
    }

    /// Observed status of the daily database-level job.
    ///
    /// Reports only what the job registry actually contains; a failed lookup
    /// reports "not configured" rather than fabricated data.
    pub async fn job_status(&self) -> CronJobStatus {
        match self.cron.find_job(&self.job_name).await {
            Ok(Some(job)) => CronJobStatus::from_descriptor(job),
            Ok(None) => CronJobStatus::not_configured(),
            Err(e) => {
                debug!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "probe",
                    job_name = %self.job_name,
                    "Cannot check daily refresh job: {}",
                    e
                );
                CronJobStatus::not_configured()
            }
        }
    }

    /// Administrative request to set up the database-level scheduler.
    ///
    /// Automatic job management is not implemented. This reports the probed
    /// pg_cron availability and says so plainly, so operators know the
    /// recurring application fallback remains the effective refresh path.
    pub async fn initialize_scheduler(&self) -> SchedulerAction {
        let available = self.is_scheduler_available().await;
        let message = if available {
            format!(
                "pg_cron is available, but automatic job management is not implemented. \
                 Create the '{}' job manually; until then the application-level daily \
                 fallback refresh remains in effect.",
                self.job_name
            )
        } else {
            "pg_cron is not available in this database. \
             The application-level daily fallback refresh remains in effect."
                .to_string()
        };
        SchedulerAction {
            pg_cron_available: available,
            message,
        }
    }

    /// Administrative request to tear down the database-level scheduler.
    ///
    /// Same honesty contract as [`initialize_scheduler`]: no job is removed.
    ///
    /// [`initialize_scheduler`]: Self::initialize_scheduler
    pub async fn disable_scheduler(&self) -> SchedulerAction {
        let available = self.is_scheduler_available().await;
        SchedulerAction {
            pg_cron_available: available,
            message: format!(
                "Automatic job management is not implemented; no database-level job was \
                 removed. Drop the '{}' job manually if one exists. The application-level \
                 daily fallback refresh remains in effect.",
                self.job_name
            ),
        }
    }

    /// Composite health report with the derived tri-state overall status.
    pub async fn health(&self) -> ViewHealth {
        let pg_cron_available = self.is_scheduler_available().await;
        let daily_job_details = self.job_status().await;
        let daily_job_active = daily_job_details.job_exists && daily_job_details.active;

        let (refresh_statistics, statistics_error) = match self.refresh_statistics().await {
            Ok(stats) => (Some(stats), None),
            Err(e) => (None, Some(e.to_string())),
        };

        let overall_status = HealthStatus::derive(pg_cron_available, daily_job_active);

        ViewHealth {
            pg_cron_available,
            daily_job_active,
            daily_job_details,
            refresh_statistics,
            statistics_error,
            overall_status,
            status_description: overall_status.description().to_string(),
            refresh_schedule: defaults::REFRESH_SCHEDULE_DESCRIPTION.to_string(),
        }
    }

    /// Run the refresh strategy chain, record the outcome, return a report.
    ///
    /// Strategies are tried in order; first success wins. Both failing yields
    /// a failed report carrying both errors. Audit-log append failure is
    /// logged but does not change the report: the refresh outcome is what
    /// callers care about.
    async fn perform_refresh(&self, kind: RefreshKind) -> RefreshReport {
        let _guard = self.refresh_lock.lock().await;
        let start = Instant::now();

        let outcome: Result<&'static str> = match self.refresher.refresh_via_function().await {
            Ok(()) => Ok("function"),
            Err(primary) => {
                warn!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "refresh",
                    strategy = "function",
                    view_name = %self.view_name,
                    "Refresh function failed, trying direct refresh: {}",
                    primary
                );
                match self.refresher.refresh_direct().await {
                    Ok(()) => Ok("direct"),
                    Err(secondary) => Err(Error::Refresh(format!(
                        "function strategy failed: {}; direct strategy failed: {}",
                        primary, secondary
                    ))),
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = match outcome {
            Ok(strategy) => {
                info!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "refresh",
                    strategy,
                    view_name = %self.view_name,
                    duration_ms,
                    kind = %kind,
                    "Materialized view refreshed"
                );
                RefreshReport {
                    success: true,
                    message: format!(
                        "Successfully refreshed materialized view in {} ms",
                        duration_ms
                    ),
                    duration_ms,
                }
            }
            Err(e) => {
                error!(
                    subsystem = "refresh",
                    component = "coordinator",
                    op = "refresh",
                    view_name = %self.view_name,
                    duration_ms,
                    kind = %kind,
                    "Failed to refresh materialized view: {}",
                    e
                );
                RefreshReport {
                    success: false,
                    message: format!("Unable to refresh materialized view: {}", e),
                    duration_ms,
                }
            }
        };

        let record = NewRefreshRecord {
            view_name: self.view_name.clone(),
            kind,
            duration_ms: duration_ms as i64,
            success: report.success,
            error_message: (!report.success).then(|| report.message.clone()),
        };
        if let Err(e) = self.log.append(record).await {
            error!(
                subsystem = "refresh",
                component = "coordinator",
                op = "append",
                view_name = %self.view_name,
                "Failed to append refresh audit record: {}",
                e
            );
        }

        report
    }
}
