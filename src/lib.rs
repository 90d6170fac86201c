//! Social backend: user authentication with email OTP codes, profiles, and posts with image attachments.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod response;
pub mod routes;
pub mod security;
pub mod service;
pub mod sql;
pub mod state;
pub mod storage;
pub mod store;

pub use config::Settings;
pub use error::{AppError, ConfigError};
pub use mail::{Mailer, SmtpMailer};
pub use routes::app;
pub use security::TokenKeys;
pub use state::AppState;
pub use storage::{ObjectStore, S3Store};
pub use store::{ensure_database_exists, ensure_tables};
