//! Domain models for the materialized-view refresh subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a refresh attempt was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshKind {
    /// Database-level pg_cron job performed the refresh.
    Scheduled,
    /// Administrative force-refresh request.
    Manual,
    /// Application-level refresh because no database job was active.
    Fallback,
}

impl RefreshKind {
    /// Stable string form stored in the refresh log table.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshKind::Scheduled => "SCHEDULED",
            RefreshKind::Manual => "MANUAL",
            RefreshKind::Fallback => "FALLBACK",
        }
    }

    /// Parse the stored string form. Unknown values map to `Fallback`,
    /// the most conservative interpretation for an audit row.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "SCHEDULED" => RefreshKind::Scheduled,
            "MANUAL" => RefreshKind::Manual,
            _ => RefreshKind::Fallback,
        }
    }
}

impl std::fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refresh attempt about to be appended to the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRefreshRecord {
    pub view_name: String,
    pub kind: RefreshKind,
    pub duration_ms: i64,
    pub success: bool,
    pub error_message: Option<String>,
}

/// One immutable row of the refresh audit log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRecord {
    pub id: i64,
    pub view_name: String,
    pub kind: RefreshKind,
    pub triggered_at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Aggregated refresh-log statistics over a recency window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatistics {
    /// Number of refresh attempts in the window.
    pub refresh_count: i64,
    /// Timestamp of the most recent attempt, if any.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Mean duration in milliseconds (absent durations counted as 0).
    pub average_duration_ms: f64,
    /// Number of failed attempts in the window.
    pub error_count: i64,
}

/// A pg_cron job row as read from `cron.job`.
///
/// Owned by the database's scheduling extension; the application only reads
/// it, never constructs or mutates it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobDescriptor {
    pub job_name: String,
    pub schedule: String,
    pub command: String,
    pub active: bool,
}

/// Observed status of the database-level refresh job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobStatus {
    /// Whether a job with the expected name exists in `cron.job`.
    pub job_exists: bool,
    /// Whether that job is active. Always false when the job doesn't exist.
    pub active: bool,
    /// Cron schedule expression, when the job exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    /// Command the job runs, when the job exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl CronJobStatus {
    /// Status reported when the job registry is absent or unreadable.
    pub fn not_configured() -> Self {
        Self {
            job_exists: false,
            active: false,
            schedule: None,
            command: None,
        }
    }

    pub fn from_descriptor(job: CronJobDescriptor) -> Self {
        Self {
            job_exists: true,
            active: job.active,
            schedule: Some(job.schedule),
            command: Some(job.command),
        }
    }
}

/// Overall refresh-subsystem status, derived from the two probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// pg_cron available and the daily job is active.
    Optimal,
    /// pg_cron available but the daily job is not configured/active.
    Available,
    /// pg_cron unavailable; the recurring application refresh is the only path.
    Fallback,
}

impl HealthStatus {
    /// Derive the tri-state status from the two probe results.
    ///
    /// Exhaustive and mutually exclusive over the 2x2 input space; a failed
    /// availability probe is folded into `available = false` by the caller.
    pub fn derive(pg_cron_available: bool, daily_job_active: bool) -> Self {
        match (pg_cron_available, daily_job_active) {
            (true, true) => HealthStatus::Optimal,
            (true, false) => HealthStatus::Available,
            (false, _) => HealthStatus::Fallback,
        }
    }

    /// Operator-facing description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            HealthStatus::Optimal => "Daily database-level refresh at 00:00 UTC is active",
            HealthStatus::Available => {
                "pg_cron available but daily job not configured. Use /initialize-scheduler to set up."
            }
            HealthStatus::Fallback => "Using application-level daily fallback scheduling",
        }
    }
}

/// Composite health report combining probes and refresh statistics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewHealth {
    pub pg_cron_available: bool,
    pub daily_job_active: bool,
    pub daily_job_details: CronJobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_statistics: Option<RefreshStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics_error: Option<String>,
    pub overall_status: HealthStatus,
    pub status_description: String,
    pub refresh_schedule: String,
}

/// Outcome of one refresh attempt (manual or fallback).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub success: bool,
    pub message: String,
    pub duration_ms: u64,
}

/// Result of a scheduled evaluate-and-refresh tick.
#[derive(Debug, Clone)]
pub enum EvaluateOutcome {
    /// Database job owns refresh duty; nothing was done and nothing recorded.
    SkippedExternallyManaged,
    /// Application performed (or attempted) the refresh itself.
    Refreshed(RefreshReport),
}

/// Result of an administrative initialize/disable scheduler request.
///
/// Automatic job management is not implemented; these report the probed
/// pg_cron availability and say so plainly rather than pretending success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerAction {
    pub pg_cron_available: bool,
    pub message: String,
}

/// One row of `active_users_stats_mv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUserStatistics {
    pub username: String,
    pub display_name: Option<String>,
    pub posts_count: i64,
    pub comments_count: i64,
    pub likes_received: i64,
    pub total_views: i64,
    pub activity_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_kind_round_trip() {
        for kind in [
            RefreshKind::Scheduled,
            RefreshKind::Manual,
            RefreshKind::Fallback,
        ] {
            assert_eq!(RefreshKind::from_str_lossy(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_refresh_kind_unknown_maps_to_fallback() {
        assert_eq!(
            RefreshKind::from_str_lossy("mystery"),
            RefreshKind::Fallback
        );
    }

    #[test]
    fn test_health_status_derivation_is_exhaustive() {
        assert_eq!(HealthStatus::derive(true, true), HealthStatus::Optimal);
        assert_eq!(HealthStatus::derive(true, false), HealthStatus::Available);
        assert_eq!(HealthStatus::derive(false, true), HealthStatus::Fallback);
        assert_eq!(HealthStatus::derive(false, false), HealthStatus::Fallback);
    }

    #[test]
    fn test_health_status_serializes_screaming() {
        let json = serde_json::to_string(&HealthStatus::Optimal).unwrap();
        assert_eq!(json, "\"OPTIMAL\"");
    }

    #[test]
    fn test_statistics_serialize_camel_case() {
        let stats = RefreshStatistics {
            refresh_count: 3,
            last_refresh: None,
            average_duration_ms: 12.5,
            error_count: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["refreshCount"], 3);
        assert_eq!(json["averageDurationMs"], 12.5);
        assert_eq!(json["errorCount"], 1);
    }

    #[test]
    fn test_cron_status_not_configured() {
        let status = CronJobStatus::not_configured();
        assert!(!status.job_exists);
        assert!(!status.active);
        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("schedule").is_none());
    }
}
