//! Runtime settings read from the environment (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use chrono::Duration;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `Social <noreply@example.com>`.
    pub from: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    /// Used as the object-store folder prefix and in email subjects.
    pub app_name: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub otp_ttl: Duration,
    pub s3_bucket: String,
    /// Public base URL for uploaded objects. Defaults to the bucket's virtual-hosted URL.
    pub s3_public_url: Option<String>,
    pub smtp: SmtpSettings,
    pub max_upload_bytes: usize,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Settings {
            database_url: var_or("DATABASE_URL", "postgres://localhost/social"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            app_name: var_or("APP_NAME", "social"),
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: required("REFRESH_TOKEN_SECRET")?,
            access_token_ttl: Duration::minutes(parsed("ACCESS_TOKEN_TTL_MINUTES", 60)?),
            refresh_token_ttl: Duration::days(parsed("REFRESH_TOKEN_TTL_DAYS", 7)?),
            otp_ttl: Duration::minutes(parsed("OTP_TTL_MINUTES", 10)?),
            s3_bucket: required("S3_BUCKET")?,
            s3_public_url: std::env::var("S3_PUBLIC_URL").ok().filter(|v| !v.is_empty()),
            smtp: SmtpSettings {
                host: var_or("SMTP_HOST", "localhost"),
                port: parsed("SMTP_PORT", 587)?,
                username: var_or("SMTP_USERNAME", ""),
                password: var_or("SMTP_PASSWORD", ""),
                from: var_or("MAIL_FROM", "Social <noreply@localhost>"),
            },
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }

    /// Base URL under which uploaded objects are served.
    pub fn public_object_url(&self) -> String {
        self.s3_public_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", self.s3_bucket))
            .trim_end_matches('/')
            .to_string()
    }
}
