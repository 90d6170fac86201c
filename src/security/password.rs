//! Argon2id hashing for passwords and one-time codes.

use crate::error::AppError;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

/// Hash a secret; the returned PHC string carries its own salt and parameters.
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(rand::thread_rng());
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("hash: {}", e)))
}

/// True when `secret` matches the stored hash.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("stored hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
