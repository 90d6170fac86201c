//! /user routes.

use crate::handlers::user::{profile, update_profile};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(profile).patch(update_profile))
        .with_state(state)
}
