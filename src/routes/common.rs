//! Health endpoints outside the API prefixes: liveness, database readiness and build info.

use crate::response::{success, success_ok};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Status {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

#[derive(Serialize)]
struct Build {
    name: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    success_ok("Service is up", Status { status: "ok", database: None })
}

/// 503 until the pool can run a query.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => success_ok("Service is ready", Status { status: "ok", database: Some("ok") }),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            success(
                StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable",
                Status { status: "degraded", database: Some("unavailable") },
            )
        }
    }
}

async fn version() -> impl IntoResponse {
    success_ok(
        "Build info",
        Build {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
