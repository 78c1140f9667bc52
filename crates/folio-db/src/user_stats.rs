//! Read access to the `active_users_stats_mv` materialized view.

use sqlx::{PgPool, Row};

use folio_core::{ActiveUserStatistics, Result};

/// Repository serving the precomputed active-user statistics.
///
/// Reads only; freshness of the underlying view is the refresh coordinator's
/// responsibility.
#[derive(Clone)]
pub struct PgActiveUserStatsRepository {
    pool: PgPool,
}

impl PgActiveUserStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All rows of the view, most active users first.
    pub async fn list(&self) -> Result<Vec<ActiveUserStatistics>> {
        let rows = sqlx::query(
            r#"
            SELECT username, display_name, posts_count, comments_count,
                   likes_received, total_views, activity_score
            FROM active_users_stats_mv
            ORDER BY activity_score DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ActiveUserStatistics {
                username: row.get("username"),
                display_name: row.get("display_name"),
                posts_count: row.get("posts_count"),
                comments_count: row.get("comments_count"),
                likes_received: row.get("likes_received"),
                total_views: row.get("total_views"),
                activity_score: row.get("activity_score"),
            })
            .collect())
    }
}
