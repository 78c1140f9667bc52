//! Coordinator behavior tests against in-memory collaborators.
//!
//! Covers the skip/refresh decision, the strategy chain, audit-record
//! accounting, fail-closed probe handling, and the health tri-state.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{defaults, EvaluateOutcome, HealthStatus, RefreshKind};
use folio_refresh::testing::{MockCron, MockRefreshLog, MockRefresher};
use folio_refresh::{RefreshCoordinator, RefreshScheduler, SchedulerConfig};

struct Fixture {
    log: Arc<MockRefreshLog>,
    refresher: Arc<MockRefresher>,
    coordinator: RefreshCoordinator,
}

fn fixture(cron: MockCron, refresher: MockRefresher) -> Fixture {
    let log = Arc::new(MockRefreshLog::new());
    let refresher = Arc::new(refresher);
    let coordinator =
        RefreshCoordinator::new(log.clone(), Arc::new(cron), refresher.clone());
    Fixture {
        log,
        refresher,
        coordinator,
    }
}

#[tokio::test]
async fn evaluate_skips_when_database_job_is_active() {
    let f = fixture(
        MockCron::with_job(defaults::DAILY_REFRESH_JOB, true),
        MockRefresher::succeeding(),
    );

    let outcome = f.coordinator.evaluate_and_refresh().await;

    assert!(matches!(outcome, EvaluateOutcome::SkippedExternallyManaged));
    assert!(f.log.records().is_empty(), "skip must not append a record");
    assert_eq!(f.refresher.total_calls(), 0, "skip must not issue a refresh");
}

#[tokio::test]
async fn evaluate_refreshes_when_no_job_exists() {
    let f = fixture(MockCron::available_without_job(), MockRefresher::succeeding());

    let outcome = f.coordinator.evaluate_and_refresh().await;

    let report = match outcome {
        EvaluateOutcome::Refreshed(report) => report,
        EvaluateOutcome::SkippedExternallyManaged => panic!("should have refreshed"),
    };
    assert!(report.success);

    let records = f.log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RefreshKind::Fallback);
    assert!(records[0].success);
}

#[tokio::test]
async fn evaluate_refreshes_when_job_exists_but_inactive() {
    let f = fixture(
        MockCron::with_job(defaults::DAILY_REFRESH_JOB, false),
        MockRefresher::succeeding(),
    );

    let outcome = f.coordinator.evaluate_and_refresh().await;

    assert!(matches!(outcome, EvaluateOutcome::Refreshed(_)));
    assert_eq!(f.log.records().len(), 1);
    assert_eq!(f.refresher.function_calls(), 1);
}

#[tokio::test]
async fn evaluate_fails_closed_when_probes_error() {
    let f = fixture(MockCron::probe_failure(), MockRefresher::succeeding());

    let outcome = f.coordinator.evaluate_and_refresh().await;

    // Broken probes must not be fatal: the application refreshes itself.
    assert!(matches!(outcome, EvaluateOutcome::Refreshed(_)));
    let records = f.log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RefreshKind::Fallback);
}

#[tokio::test]
async fn recent_refreshes_returns_audit_rows_newest_first() {
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());

    f.coordinator.force_refresh().await;
    f.coordinator.evaluate_and_refresh().await;

    let history = f
        .coordinator
        .recent_refreshes(defaults::REFRESH_HISTORY_LIMIT)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, RefreshKind::Fallback);
    assert_eq!(history[1].kind, RefreshKind::Manual);
    assert!(history
        .iter()
        .all(|r| r.view_name == defaults::ACTIVE_USERS_VIEW));

    let capped = f.coordinator.recent_refreshes(1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].kind, RefreshKind::Fallback);
}

#[tokio::test]
async fn force_refresh_ignores_active_database_job() {
    let f = fixture(
        MockCron::with_job(defaults::DAILY_REFRESH_JOB, true),
        MockRefresher::succeeding(),
    );

    let report = f.coordinator.force_refresh().await;

    assert!(report.success);
    assert!(report.message.contains("Successfully refreshed"));
    let records = f.log.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, RefreshKind::Manual);
    assert!(records[0].duration_ms >= 0);
}

#[tokio::test]
async fn force_refresh_falls_back_to_direct_statement() {
    let f = fixture(
        MockCron::unavailable(),
        MockRefresher::function_fails_direct_succeeds(),
    );

    let report = f.coordinator.force_refresh().await;

    assert!(report.success);
    assert_eq!(f.refresher.function_calls(), 1);
    assert_eq!(f.refresher.direct_calls(), 1);

    let records = f.log.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
}

#[tokio::test]
async fn force_refresh_records_failure_when_both_strategies_fail() {
    let f = fixture(MockCron::unavailable(), MockRefresher::both_fail());

    let report = f.coordinator.force_refresh().await;

    assert!(!report.success);
    assert!(report.message.contains("function strategy failed"));
    assert!(report.message.contains("direct strategy failed"));

    let records = f.log.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    let err = records[0].error_message.as_deref().unwrap();
    assert!(err.contains("does not exist"));
}

#[tokio::test]
async fn audit_append_failure_does_not_change_the_report() {
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());
    f.log.fail_appends();

    let report = f.coordinator.force_refresh().await;

    assert!(report.success, "log trouble must not fail the refresh");
}

#[tokio::test]
async fn statistics_aggregate_matches_recorded_attempts() {
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());

    for _ in 0..3 {
        f.coordinator.force_refresh().await;
    }

    let stats = f.coordinator.refresh_statistics().await.unwrap();
    assert_eq!(stats.refresh_count, 3);
    assert_eq!(stats.error_count, 0);
    assert!(stats.average_duration_ms >= 0.0);
    assert!(stats.last_refresh.is_some());
}

#[tokio::test]
async fn statistics_query_failure_propagates_as_error() {
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());
    f.log.fail_statistics("relation does not exist");

    let result = f.coordinator.refresh_statistics().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn availability_probe_failure_reads_as_unavailable() {
    let f = fixture(MockCron::probe_failure(), MockRefresher::succeeding());
    assert!(!f.coordinator.is_scheduler_available().await);
}

#[tokio::test]
async fn job_status_reports_not_configured_on_probe_failure() {
    let f = fixture(MockCron::probe_failure(), MockRefresher::succeeding());
    let status = f.coordinator.job_status().await;
    assert!(!status.job_exists);
    assert!(!status.active);
    assert!(status.schedule.is_none());
}

#[tokio::test]
async fn health_is_optimal_with_active_job() {
    let f = fixture(
        MockCron::with_job(defaults::DAILY_REFRESH_JOB, true),
        MockRefresher::succeeding(),
    );

    let health = f.coordinator.health().await;
    assert_eq!(health.overall_status, HealthStatus::Optimal);
    assert!(health.pg_cron_available);
    assert!(health.daily_job_active);
}

#[tokio::test]
async fn health_is_available_without_configured_job() {
    let f = fixture(MockCron::available_without_job(), MockRefresher::succeeding());

    let health = f.coordinator.health().await;
    assert_eq!(health.overall_status, HealthStatus::Available);
    assert!(health.pg_cron_available);
    assert!(!health.daily_job_active);
    assert!(!health.daily_job_details.job_exists);
}

#[tokio::test]
async fn health_is_fallback_when_extension_absent_or_probe_fails() {
    for cron in [MockCron::unavailable(), MockCron::probe_failure()] {
        let f = fixture(cron, MockRefresher::succeeding());
        let health = f.coordinator.health().await;
        assert_eq!(health.overall_status, HealthStatus::Fallback);
        assert!(!health.pg_cron_available);
    }
}

#[tokio::test]
async fn health_carries_statistics_error_instead_of_partial_data() {
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());
    f.log.fail_statistics("aggregation exploded");

    let health = f.coordinator.health().await;
    assert!(health.refresh_statistics.is_none());
    assert!(health
        .statistics_error
        .as_deref()
        .unwrap()
        .contains("aggregation exploded"));
}

#[tokio::test]
async fn fallback_deployment_end_to_end() {
    // pg_cron absent: health reports FALLBACK, a forced refresh succeeds with
    // a duration in its message, and statistics afterward show one clean run.
    let f = fixture(MockCron::unavailable(), MockRefresher::succeeding());

    let health = f.coordinator.health().await;
    assert_eq!(health.overall_status, HealthStatus::Fallback);

    let report = f.coordinator.force_refresh().await;
    assert!(report.success);
    assert!(report.message.contains(&format!("{} ms", report.duration_ms)));

    let stats = f.coordinator.refresh_statistics().await.unwrap();
    assert_eq!(stats.refresh_count, 1);
    assert_eq!(stats.error_count, 0);
}

#[tokio::test]
async fn scheduler_stub_operations_keep_the_honesty_contract() {
    let f = fixture(MockCron::available_without_job(), MockRefresher::succeeding());

    let init = f.coordinator.initialize_scheduler().await;
    assert!(init.pg_cron_available);
    assert!(init.message.contains("not implemented"));

    let disable = f.coordinator.disable_scheduler().await;
    assert!(disable.message.contains("no database-level job was removed"));
}

#[tokio::test]
async fn scheduler_task_ticks_and_shuts_down() {
    let log = Arc::new(MockRefreshLog::new());
    let refresher = Arc::new(MockRefresher::succeeding());
    let coordinator = Arc::new(RefreshCoordinator::new(
        log.clone(),
        Arc::new(MockCron::unavailable()),
        refresher.clone(),
    ));

    let config = SchedulerConfig::default().with_interval(Duration::from_millis(10));
    let handle = RefreshScheduler::new(coordinator, config).start();

    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.shutdown().await;

    let ticks = log.records().len();
    assert!(ticks >= 2, "expected several ticks, saw {}", ticks);
    assert!(log.records().iter().all(|r| r.kind == RefreshKind::Fallback));
}

#[tokio::test]
async fn disabled_scheduler_never_ticks() {
    let log = Arc::new(MockRefreshLog::new());
    let coordinator = Arc::new(RefreshCoordinator::new(
        log.clone(),
        Arc::new(MockCron::unavailable()),
        Arc::new(MockRefresher::succeeding()),
    ));

    let config = SchedulerConfig::default()
        .with_interval(Duration::from_millis(10))
        .with_enabled(false);
    let handle = RefreshScheduler::new(coordinator, config).start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown().await;

    assert!(log.records().is_empty());
}
