//! Request body validation: field rules shared by the auth and user schemas.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

pub const OTP_LENGTH: usize = 6;

/// Implemented by request bodies; returns the first failing rule.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("static email pattern")
    })
}

fn password_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z\d]{8,}$").expect("static password pattern"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(002|\+2)?01[0125][0-9]{8}$").expect("static phone pattern"))
}

pub fn username(v: &str) -> Result<(), AppError> {
    let len = v.trim().chars().count();
    if !(2..=50).contains(&len) {
        return Err(AppError::Validation(
            "username must be between 2 and 50 characters".into(),
        ));
    }
    Ok(())
}

pub fn email(v: &str) -> Result<(), AppError> {
    if !email_re().is_match(v.trim()) {
        return Err(AppError::Validation("email must be a valid email".into()));
    }
    Ok(())
}

/// At least 8 letters or digits, with a digit, a lowercase and an uppercase letter.
pub fn password(v: &str) -> Result<(), AppError> {
    let strong = password_re().is_match(v)
        && v.chars().any(|c| c.is_ascii_digit())
        && v.chars().any(|c| c.is_ascii_lowercase())
        && v.chars().any(|c| c.is_ascii_uppercase());
    if !strong {
        return Err(AppError::Validation(
            "password must be at least 8 letters or digits with an uppercase letter, a lowercase letter and a digit"
                .into(),
        ));
    }
    Ok(())
}

pub fn confirmation(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password != confirmation {
        return Err(AppError::Validation(
            "confirmationPassword must match password".into(),
        ));
    }
    Ok(())
}

pub fn phone_number(v: &str) -> Result<(), AppError> {
    if !phone_re().is_match(v.trim()) {
        return Err(AppError::Validation("phoneNumber is not a valid phone number".into()));
    }
    Ok(())
}

pub fn otp(v: &str) -> Result<(), AppError> {
    if v.len() != OTP_LENGTH || !v.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!("OTP must be {} digits", OTP_LENGTH)));
    }
    Ok(())
}

/// Path ids are UUIDs; anything else is rejected before touching the database.
pub fn object_id(name: &str, v: &str) -> Result<uuid::Uuid, AppError> {
    uuid::Uuid::parse_str(v).map_err(|_| AppError::Validation(format!("{} must be a valid id", name)))
}
