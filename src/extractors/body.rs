//! JSON body that has passed its schema rules.

use crate::error::AppError;
use crate::service::Validate;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// Like `Json<T>`, but malformed bodies and failed rules both answer with the error envelope.
#[derive(Debug)]
pub struct ValidBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(ValidBody(value))
    }
}
