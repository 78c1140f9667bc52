//! # folio-db
//!
//! PostgreSQL database layer for the folio blog backend's refresh subsystem.
//!
//! This crate provides:
//! - Connection pool management
//! - The refresh audit log repository
//! - Read-only pg_cron probes
//! - Materialized-view refresh execution
//! - Read access to the active-user statistics view
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/folio").await?;
//!     let stats = db.user_stats.list().await?;
//!     println!("{} active users", stats.len());
//!     Ok(())
//! }
//! ```

pub mod cron;
pub mod pool;
pub mod refresh_log;
pub mod user_stats;
pub mod views;

// Re-export core types
pub use folio_core::*;

pub use cron::PgCronScheduler;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use refresh_log::PgRefreshLogRepository;
pub use user_stats::PgActiveUserStatsRepository;
pub use views::PgViewRefresher;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// Refresh audit log repository.
    pub refresh_log: PgRefreshLogRepository,
    /// pg_cron capability probes.
    pub cron: PgCronScheduler,
    /// Materialized-view refresh execution.
    pub views: PgViewRefresher,
    /// Active-user statistics view reader.
    pub user_stats: PgActiveUserStatsRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            refresh_log: PgRefreshLogRepository::new(pool.clone()),
            cron: PgCronScheduler::new(pool.clone()),
            views: PgViewRefresher::new(pool.clone()),
            user_stats: PgActiveUserStatsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }
}

/// Run embedded schema migrations against the given pool.
#[cfg(feature = "migrations")]
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Config(format!("migration failed: {}", e)))
}
