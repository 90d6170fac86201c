//! /auth routes.

use crate::handlers::auth::{
    confirm_email, forget_password, login, refresh_token, register, resend_confirmation, reset_password,
    validate_reset_code,
};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/confirm-email", patch(confirm_email))
        .route("/resend-confirmation", patch(resend_confirmation))
        .route("/login", post(login))
        .route("/refresh-token", get(refresh_token))
        .route("/forget-password", patch(forget_password))
        .route("/validate-reset-code", patch(validate_reset_code))
        .route("/reset-password", patch(reset_password))
        .with_state(state)
}
