//! folio-api - HTTP API server for the folio refresh subsystem.
//!
//! Exposes the administrative materialized-view endpoints under
//! `/private/materialized-views` and the active-user statistics read under
//! `/api/posts/statistics/active-users`. Router construction lives here so
//! integration tests can drive it in-process with mock collaborators.

pub mod handlers;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use folio_db::Database;
use folio_refresh::RefreshCoordinator;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database repositories (statistics view reads).
    pub db: Database,
    /// Materialized-view refresh coordinator.
    pub coordinator: Arc<RefreshCoordinator>,
}

/// Build the application router.
///
/// Middleware layers (trace, CORS, request IDs) are attached by the binary;
/// tests exercise the bare routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/private/materialized-views/refresh",
            post(handlers::materialized_views::force_refresh),
        )
        .route(
            "/private/materialized-views/statistics",
            get(handlers::materialized_views::statistics),
        )
        .route(
            "/private/materialized-views/refresh-history",
            get(handlers::materialized_views::refresh_history),
        )
        .route(
            "/private/materialized-views/initialize-scheduler",
            post(handlers::materialized_views::initialize_scheduler),
        )
        .route(
            "/private/materialized-views/disable-scheduler",
            post(handlers::materialized_views::disable_scheduler),
        )
        .route(
            "/private/materialized-views/cron-status",
            get(handlers::materialized_views::cron_status),
        )
        .route(
            "/private/materialized-views/health",
            get(handlers::materialized_views::health),
        )
        .route(
            "/api/posts/statistics/active-users",
            get(handlers::statistics::active_users),
        )
        .with_state(state)
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

/// Error type for the non-administrative endpoints.
///
/// The `/private/materialized-views` surface deliberately bypasses this: it
/// always answers 200 with a structured `success` flag so diagnostics stay
/// inspectable during datastore trouble.
#[derive(Debug)]
pub enum ApiError {
    Database(folio_core::Error),
    NotFound(String),
}

impl From<folio_core::Error> for ApiError {
    fn from(err: folio_core::Error) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
