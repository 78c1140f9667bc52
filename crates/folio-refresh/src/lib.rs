//! # folio-refresh
//!
//! Materialized-view refresh coordination for the folio blog backend.
//!
//! The [`RefreshCoordinator`] keeps `active_users_stats_mv` fresh with
//! minimal duplicate work: when a database-level pg_cron job owns refresh
//! duty it stands down; otherwise it refreshes the view itself and records
//! every attempt in an append-only audit log. The [`RefreshScheduler`] drives
//! it on a recurring interval.

pub mod coordinator;
pub mod scheduler;

// In-memory fakes for the coordinator's collaborators.
// Note: always compiled so integration tests (in tests/) and downstream
// crates can use them without a live database.
pub mod testing;

pub use coordinator::RefreshCoordinator;
pub use scheduler::{RefreshScheduler, SchedulerConfig, SchedulerHandle};
