//! One-time numeric codes for email confirmation and password reset.

use crate::error::AppError;
use crate::security::verify_secret;
use crate::service::validation::OTP_LENGTH;
use chrono::{DateTime, Utc};
use rand::Rng;

pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Check a submitted code against the stored hash and its expiry.
pub fn check_otp(
    code: &str,
    stored_hash: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let hash = stored_hash.ok_or_else(|| AppError::BadRequest("No active code, request a new one".into()))?;
    if expires_at.map_or(true, |t| t <= now) {
        return Err(AppError::BadRequest("Code expired, request a new one".into()));
    }
    if !verify_secret(code, hash)? {
        return Err(AppError::BadRequest("Invalid code".into()));
    }
    Ok(())
}
