//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, probe results, config choices |

/// Subsystem originating the log event.
/// Values: "api", "db", "refresh"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "coordinator", "scheduler", "pool", "cron_probe"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "evaluate", "force_refresh", "probe", "append"
pub const OPERATION: &str = "op";

/// Materialized view being operated on.
pub const VIEW_NAME: &str = "view_name";

/// pg_cron job name being probed.
pub const JOB_NAME: &str = "job_name";

/// Refresh strategy that produced the outcome ("function" or "direct").
pub const STRATEGY: &str = "strategy";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";
