//! Standard response envelope helpers: every success body is `{ message, data }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            message: message.into(),
            data: Some(data),
        }),
    )
}

pub fn success_ok<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::OK, message, data)
}

pub fn success_created<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::CREATED, message, data)
}

/// Envelope without data, e.g. for "check your inbox" style answers.
pub fn message_ok(message: impl Into<String>) -> (StatusCode, Json<Envelope<()>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            message: message.into(),
            data: None,
        }),
    )
}
