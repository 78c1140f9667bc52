//! # folio-core
//!
//! Core types, traits, and abstractions for the folio blog backend's
//! materialized-view refresh subsystem.
//!
//! This crate provides:
//! - The shared [`Error`]/[`Result`] types
//! - Domain models (refresh audit records, cron job status, health reports)
//! - Capability traits the coordinator depends on ([`RefreshLogRepository`],
//!   [`CronScheduler`], [`ViewRefresher`])
//! - Defaults and structured-logging field constants

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

pub use error::{Error, Result};
pub use models::{
    ActiveUserStatistics, CronJobDescriptor, CronJobStatus, EvaluateOutcome, HealthStatus,
    NewRefreshRecord, RefreshKind, RefreshRecord, RefreshReport, RefreshStatistics,
    SchedulerAction, ViewHealth,
};
pub use traits::{CronScheduler, RefreshLogRepository, ViewRefresher};
