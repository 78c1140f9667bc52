//! Read endpoints over the precomputed statistics views.

use axum::{extract::State, Json};

use folio_core::ActiveUserStatistics;

use crate::{ApiError, AppState};

/// GET /api/posts/statistics/active-users
///
/// Serves the contents of `active_users_stats_mv`, most active users first.
/// Freshness is the refresh coordinator's concern; this is a plain read.
pub async fn active_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActiveUserStatistics>>, ApiError> {
    let stats = state.db.user_stats.list().await?;
    Ok(Json(stats))
}
