//! folio-api server binary.

use std::sync::Arc;

use anyhow::Context;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use folio_api::{build_router, AppState};
use folio_db::{create_pool_with_config, Database, PoolConfig};
use folio_refresh::{RefreshCoordinator, RefreshScheduler, SchedulerConfig};

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation when chasing a refresh gone wrong across api and db logs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

const REQUEST_ID_HEADER: &str = "x-request-id";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool_with_config(&database_url, PoolConfig::from_env()).await?;
    folio_db::run_migrations(&pool)
        .await
        .context("schema migration failed")?;

    let db = Database::new(pool);
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(db.refresh_log.clone()),
        Arc::new(db.cron.clone()),
        Arc::new(db.views.clone()),
    ));

    let scheduler =
        RefreshScheduler::new(coordinator.clone(), SchedulerConfig::from_env()).start();

    let state = AppState { db, coordinator };
    let request_id_header = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuidV7,
        ));

    let bind = std::env::var("FOLIO_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!(subsystem = "api", bind = %bind, "folio-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(subsystem = "api", "Shutdown signal received");
        })
        .await?;

    scheduler.shutdown().await;
    Ok(())
}
