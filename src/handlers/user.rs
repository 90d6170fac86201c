//! Profile of the authenticated user.

use crate::error::AppError;
use crate::extractors::{AuthUser, ValidBody};
use crate::models::{User, UserProfile};
use crate::response::success_ok;
use crate::service::validation as rules;
use crate::service::{Repository, Validate};
use crate::sql::{Filter, Patch};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    pub username: Option<String>,
    pub phone_number: Option<String>,
}

impl Validate for UpdateProfileBody {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.is_none() && self.phone_number.is_none() {
            return Err(AppError::Validation("nothing to update".into()));
        }
        if let Some(u) = &self.username {
            rules::username(u)?;
        }
        if let Some(p) = &self.phone_number {
            rules::phone_number(p)?;
        }
        Ok(())
    }
}

/// GET /user/profile
pub async fn profile(auth: AuthUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_ok("Profile retrieved successfully", UserProfile::from(&auth.0)))
}

/// PATCH /user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidBody(body): ValidBody<UpdateProfileBody>,
) -> Result<impl IntoResponse, AppError> {
    let patch = Patch::new()
        .set_opt("username", body.username.map(|u| u.trim().to_string()))
        .set_opt("phone_number", body.phone_number.map(|p| p.trim().to_string()));
    let user: User = Repository::find_one_and_update(&state.pool, &Filter::new().eq("id", auth.id()), &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(success_ok("Profile updated successfully", UserProfile::from(&user)))
}
