//! Auth handlers: register, confirm email (and resend its code), login, token refresh and password reset by OTP.

use crate::error::AppError;
use crate::extractors::auth::{authenticate, bearer_token};
use crate::extractors::ValidBody;
use crate::mail::{otp_email, send_in_background, OtpPurpose};
use crate::models::{User, UserProfile};
use crate::response::{message_ok, success_created, success_ok};
use crate::security::{check_otp, generate_otp, hash_secret, verify_secret, TokenKind};
use crate::service::validation as rules;
use crate::service::{Repository, Validate};
use crate::sql::{BindValue, Filter, Patch};
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirmation_password: String,
    pub phone_number: String,
}

impl Validate for RegisterBody {
    fn validate(&self) -> Result<(), AppError> {
        rules::username(&self.username)?;
        rules::email(&self.email)?;
        rules::password(&self.password)?;
        rules::confirmation(&self.password, &self.confirmation_password)?;
        rules::phone_number(&self.phone_number)
    }
}

/// Body of confirm-email and validate-reset-code.
#[derive(Debug, Deserialize)]
pub struct OtpBody {
    pub email: String,
    #[serde(rename = "OTP")]
    pub otp: String,
}

impl Validate for OtpBody {
    fn validate(&self) -> Result<(), AppError> {
        rules::email(&self.email)?;
        rules::otp(&self.otp)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl Validate for LoginBody {
    fn validate(&self) -> Result<(), AppError> {
        rules::email(&self.email)?;
        rules::password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

impl Validate for EmailBody {
    fn validate(&self) -> Result<(), AppError> {
        rules::email(&self.email)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    pub email: String,
    #[serde(rename = "OTP")]
    pub otp: String,
    pub password: String,
    pub confirmation_password: String,
}

impl Validate for ResetPasswordBody {
    fn validate(&self) -> Result<(), AppError> {
        rules::email(&self.email)?;
        rules::otp(&self.otp)?;
        rules::password(&self.password)?;
        rules::confirmation(&self.password, &self.confirmation_password)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_by_email(state: &AppState, email: &str, confirmed: Option<bool>) -> Result<Option<User>, AppError> {
    let mut filter = Filter::new().eq("email", normalize_email(email));
    if let Some(c) = confirmed {
        filter = filter.eq("confirm_email", c);
    }
    Repository::find_one(&state.pool, &filter).await
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<RegisterBody>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&body.email);
    if find_by_email(&state, &email, None).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".into()));
    }
    let otp = generate_otp();
    let values: Vec<(&'static str, BindValue)> = vec![
        ("username", body.username.trim().into()),
        ("email", email.clone().into()),
        ("password", hash_secret(&body.password)?.into()),
        ("phone_number", body.phone_number.trim().into()),
        ("confirm_email_otp", hash_secret(&otp)?.into()),
        ("otp_expires_at", (Utc::now() + state.settings.otp_ttl).into()),
    ];
    let user: User = Repository::create(&state.pool, &values).await?;
    send_in_background(
        state.mailer.clone(),
        otp_email(&state.settings.app_name, OtpPurpose::ConfirmEmail, &user.email, &otp),
    );
    tracing::info!(user_id = %user.id, "user registered");
    Ok(success_created("User created successfully", UserProfile::from(&user)))
}

/// PATCH /auth/confirm-email
pub async fn confirm_email(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<OtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, Some(false))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found or already confirmed".into()))?;
    check_otp(
        &body.otp,
        user.confirm_email_otp.as_deref(),
        user.otp_expires_at,
        Utc::now(),
    )?;
    let patch = Patch::new()
        .set("confirm_email", true)
        .unset("confirm_email_otp")
        .unset("otp_expires_at");
    Repository::find_one_and_update::<User>(&state.pool, &Filter::new().eq("id", user.id), &patch).await?;
    tracing::info!(user_id = %user.id, "email confirmed");
    Ok(message_ok("Email confirmed successfully"))
}

/// PATCH /auth/resend-confirmation: replaces the confirmation code of an unconfirmed account.
pub async fn resend_confirmation(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<EmailBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, Some(false))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found or already confirmed".into()))?;
    let otp = generate_otp();
    let patch = Patch::new()
        .set("confirm_email_otp", hash_secret(&otp)?)
        .set("otp_expires_at", Utc::now() + state.settings.otp_ttl);
    Repository::find_one_and_update::<User>(&state.pool, &Filter::new().eq("id", user.id), &patch).await?;
    send_in_background(
        state.mailer.clone(),
        otp_email(&state.settings.app_name, OtpPurpose::ConfirmEmail, &user.email, &otp),
    );
    tracing::info!(user_id = %user.id, "confirmation code reissued");
    Ok(message_ok("Check your inbox"))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, None)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid credentials".into()))?;
    if !verify_secret(&body.password, &user.password)? {
        return Err(AppError::NotFound("Invalid credentials".into()));
    }
    if !user.confirm_email {
        return Err(AppError::BadRequest("Please confirm your email first".into()));
    }
    let tokens = state.tokens.issue_pair(user.id, user.role)?;
    tracing::info!(user_id = %user.id, "login");
    Ok(success_ok("Login successful", tokens))
}

/// GET /auth/refresh-token with the refresh token as bearer.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let user = authenticate(&state, token, TokenKind::Refresh).await?;
    let tokens = state.tokens.issue_pair(user.id, user.role)?;
    Ok(success_ok("Token refreshed successfully", tokens))
}

/// PATCH /auth/forget-password
pub async fn forget_password(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<EmailBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, Some(true))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let otp = generate_otp();
    let patch = Patch::new()
        .set("reset_password_otp", hash_secret(&otp)?)
        .set("otp_expires_at", Utc::now() + state.settings.otp_ttl)
        .set("reset_code_verified", false);
    Repository::find_one_and_update::<User>(&state.pool, &Filter::new().eq("id", user.id), &patch).await?;
    send_in_background(
        state.mailer.clone(),
        otp_email(&state.settings.app_name, OtpPurpose::ResetPassword, &user.email, &otp),
    );
    Ok(message_ok("Check your inbox"))
}

/// PATCH /auth/validate-reset-code: checks the code without consuming it.
pub async fn validate_reset_code(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<OtpBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, Some(true))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    check_otp(&body.otp, user.reset_password_otp.as_deref(), user.otp_expires_at, Utc::now())?;
    let patch = Patch::new().set("reset_code_verified", true);
    Repository::find_one_and_update::<User>(&state.pool, &Filter::new().eq("id", user.id), &patch).await?;
    Ok(message_ok("Valid code"))
}

/// PATCH /auth/reset-password: needs a validated code, consumes it and revokes tokens issued before now.
pub async fn reset_password(
    State(state): State<AppState>,
    ValidBody(body): ValidBody<ResetPasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_by_email(&state, &body.email, Some(true))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !user.reset_code_verified {
        return Err(AppError::BadRequest("Validate the reset code first".into()));
    }
    check_otp(&body.otp, user.reset_password_otp.as_deref(), user.otp_expires_at, Utc::now())?;
    let patch = Patch::new()
        .set("password", hash_secret(&body.password)?)
        .unset("reset_password_otp")
        .unset("otp_expires_at")
        .set("reset_code_verified", false)
        .set("change_credentials_time", Utc::now());
    Repository::find_one_and_update::<User>(&state.pool, &Filter::new().eq("id", user.id), &patch).await?;
    tracing::info!(user_id = %user.id, "password reset");
    Ok(message_ok("Password reset successfully"))
}
