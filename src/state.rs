//! Shared application state for all routes.

use crate::config::Settings;
use crate::mail::Mailer;
use crate::security::TokenKeys;
use crate::storage::ObjectStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub tokens: Arc<TokenKeys>,
    pub storage: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
}
