//! Authenticated caller from the `Authorization: Bearer <token>` header.

use crate::error::AppError;
use crate::models::{Role, User};
use crate::security::{Claims, TokenKind};
use crate::service::Repository;
use crate::sql::Filter;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("authorization header is required".into()))?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized("authorization must be a bearer token".into())),
    }
}

/// A token stays valid only while it postdates the last credential change and carries the user's current role.
pub fn check_claims(claims: &Claims, user: &User) -> Result<(), AppError> {
    let revoked = user
        .change_credentials_time
        .map_or(false, |changed| claims.iat < changed.timestamp());
    if revoked || claims.role != user.role {
        return Err(AppError::Unauthorized("token revoked, log in again".into()));
    }
    Ok(())
}

/// Verify the token, load its user and apply `check_claims`.
pub async fn authenticate(state: &AppState, token: &str, kind: TokenKind) -> Result<User, AppError> {
    let claims = state.tokens.verify(token, kind)?;
    let user: User = Repository::find_one(&state.pool, &Filter::new().eq("id", claims.sub))
        .await?
        .ok_or_else(|| AppError::Unauthorized("account not found".into()))?;
    check_claims(&claims, &user)?;
    Ok(user)
}

#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Endpoint authorization: the caller's role must be in `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("not authorized for this action".into()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = authenticate(state, token, TokenKind::Access).await?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{DateTime, Duration, Utc};

    fn headers(v: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer  abc ")).unwrap(), "abc");
    }

    fn user(role: Role, changed: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "maria".into(),
            email: "maria@example.com".into(),
            password: String::new(),
            phone_number: "01012345678".into(),
            role,
            confirm_email: true,
            confirm_email_otp: None,
            reset_password_otp: None,
            otp_expires_at: None,
            reset_code_verified: false,
            change_credentials_time: changed,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn claims(user: &User, role: Role, iat: DateTime<Utc>) -> Claims {
        Claims {
            sub: user.id,
            role,
            kind: TokenKind::Access,
            iat: iat.timestamp(),
            exp: (iat + Duration::hours(1)).timestamp(),
        }
    }

    #[test]
    fn tokens_before_credential_change_are_revoked() {
        let now = Utc::now();
        let u = user(Role::User, Some(now));
        assert!(check_claims(&claims(&u, Role::User, now - Duration::minutes(1)), &u).is_err());
        assert!(check_claims(&claims(&u, Role::User, now + Duration::seconds(1)), &u).is_ok());
        let fresh = user(Role::User, None);
        assert!(check_claims(&claims(&fresh, Role::User, now), &fresh).is_ok());
    }

    #[test]
    fn tokens_with_a_stale_role_are_revoked() {
        let u = user(Role::User, None);
        let err = check_claims(&claims(&u, Role::Admin, Utc::now()), &u).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(m) if m == "token revoked, log in again"));
    }

    #[test]
    fn rejects_missing_or_other_schemes() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(AppError::Unauthorized(_))));
        assert!(bearer_token(&headers("Basic abc")).is_err());
        assert!(bearer_token(&headers("Bearer")).is_err());
    }
}
