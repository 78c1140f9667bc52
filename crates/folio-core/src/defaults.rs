//! Default values and tunable constants for the refresh subsystem.
//!
//! Centralized so operational knobs are discoverable in one place instead of
//! scattered magic numbers.

/// Materialized view kept fresh by the coordinator.
pub const ACTIVE_USERS_VIEW: &str = "active_users_stats_mv";

/// Name of the database-level pg_cron job that owns refresh duty when present.
pub const DAILY_REFRESH_JOB: &str = "daily-active-users-mv-refresh-job";

/// SQL function wrapping the concurrent view refresh.
pub const REFRESH_FUNCTION: &str = "refresh_active_users_mv";

/// Human-readable schedule for the daily refresh (reported by admin endpoints).
pub const REFRESH_SCHEDULE_DESCRIPTION: &str = "Daily at 00:00 UTC";

/// Recency window for refresh statistics, in hours.
pub const STATS_WINDOW_HOURS: i64 = 24;

/// Number of audit rows returned by the refresh-history endpoint.
pub const REFRESH_HISTORY_LIMIT: i64 = 20;

/// Interval between scheduled evaluate-and-refresh ticks, in seconds (daily).
pub const REFRESH_INTERVAL_SECS: u64 = 86_400;

/// Bounded timeout for capability probes (extension / job existence), in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Bounded timeout for the refresh call itself, in seconds.
///
/// Materialized-view refresh over large data can be slow, so this is
/// deliberately generous compared to the probe timeout.
pub const REFRESH_TIMEOUT_SECS: u64 = 60;
