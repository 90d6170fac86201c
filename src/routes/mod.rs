//! Router assembly: common, /auth, /user and /post, plus the not-found fallback and HTTP layers.

pub mod auth;
pub mod common;
pub mod post;
pub mod user;

pub use auth::auth_routes;
pub use common::common_routes;
pub use post::post_routes;
pub use user::user_routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    Json, Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "message": "not found" })),
    )
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let max_body = state.settings.max_upload_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/user", user_routes(state.clone()))
        .nest("/post", post_routes(state))
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
