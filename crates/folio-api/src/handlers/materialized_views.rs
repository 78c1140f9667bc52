//! Administrative materialized-view endpoints.
//!
//! Operational/diagnostic surface: every endpoint answers HTTP 200 with an
//! explicit `success` flag and, on failure, an `error` field. A bodyless 5xx
//! would make the subsystem uninspectable exactly when the datastore is in
//! trouble, which is when operators reach for these endpoints.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use folio_core::defaults;

use crate::AppState;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// POST /private/materialized-views/refresh
pub async fn force_refresh(State(state): State<AppState>) -> Json<Value> {
    info!(subsystem = "api", op = "force_refresh", "Force refresh request received");
    let report = state.coordinator.force_refresh().await;

    Json(if report.success {
        json!({
            "success": true,
            "message": report.message,
            "timestamp": now_ms(),
        })
    } else {
        json!({
            "success": false,
            "error": report.message,
            "timestamp": now_ms(),
        })
    })
}

/// GET /private/materialized-views/statistics
pub async fn statistics(State(state): State<AppState>) -> Json<Value> {
    Json(match state.coordinator.refresh_statistics().await {
        Ok(stats) => json!({
            "success": true,
            "statistics": stats,
            "timestamp": now_ms(),
        }),
        Err(e) => json!({
            "success": false,
            "error": e.to_string(),
            "timestamp": now_ms(),
        }),
    })
}

/// GET /private/materialized-views/refresh-history
pub async fn refresh_history(State(state): State<AppState>) -> Json<Value> {
    Json(
        match state
            .coordinator
            .recent_refreshes(defaults::REFRESH_HISTORY_LIMIT)
            .await
        {
            Ok(records) => json!({
                "success": true,
                "history": records,
                "timestamp": now_ms(),
            }),
            Err(e) => json!({
                "success": false,
                "error": e.to_string(),
                "timestamp": now_ms(),
            }),
        },
    )
}

/// POST /private/materialized-views/initialize-scheduler
pub async fn initialize_scheduler(State(state): State<AppState>) -> Json<Value> {
    info!(subsystem = "api", op = "initialize_scheduler", "Initialize daily scheduler request received");
    let action = state.coordinator.initialize_scheduler().await;

    Json(json!({
        "success": true,
        "message": action.message,
        "pgCronAvailable": action.pg_cron_available,
        "scheduleInfo": "Daily refresh at 00:00 UTC",
        "timestamp": now_ms(),
    }))
}

/// POST /private/materialized-views/disable-scheduler
pub async fn disable_scheduler(State(state): State<AppState>) -> Json<Value> {
    info!(subsystem = "api", op = "disable_scheduler", "Disable daily scheduler request received");
    let action = state.coordinator.disable_scheduler().await;

    Json(json!({
        "success": true,
        "message": action.message,
        "pgCronAvailable": action.pg_cron_available,
        "fallbackInfo": "Application will use daily fallback scheduling",
        "timestamp": now_ms(),
    }))
}

/// GET /private/materialized-views/cron-status
pub async fn cron_status(State(state): State<AppState>) -> Json<Value> {
    let pg_cron_available = state.coordinator.is_scheduler_available().await;
    let job_status = state.coordinator.job_status().await;

    Json(json!({
        "success": true,
        "pgCronAvailable": pg_cron_available,
        "dailyJobInfo": job_status,
        "scheduleDescription": defaults::REFRESH_SCHEDULE_DESCRIPTION,
        "timestamp": now_ms(),
    }))
}

/// GET /private/materialized-views/health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let health = state.coordinator.health().await;

    Json(json!({
        "success": true,
        "health": health,
        "timestamp": now_ms(),
    }))
}
