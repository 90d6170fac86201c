//! JWT issuance and verification (HS256). Access and refresh tokens use separate secrets.

use crate::config::Settings;
use crate::error::AppError;
use crate::models::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

pub struct TokenKeys {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenKeys {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let pair = |secret: &str, ttl| KeyPair {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        };
        TokenKeys {
            access: pair(access_secret, access_ttl),
            refresh: pair(refresh_secret, refresh_ttl),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.access_token_secret,
            &settings.refresh_token_secret,
            settings.access_token_ttl,
            settings.refresh_token_ttl,
        )
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, kind: TokenKind) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            kind,
            iat: now.timestamp(),
            exp: (now + keys.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("sign token: {}", e)))
    }

    pub fn issue_pair(&self, user_id: Uuid, role: Role) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, role, TokenKind::Access)?,
            refresh_token: self.issue(user_id, role, TokenKind::Refresh)?,
        })
    }

    /// Decode and check signature, expiry and kind.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation)?;
        if data.claims.kind != kind {
            return Err(AppError::Unauthorized("invalid token".into()));
        }
        Ok(data.claims)
    }
}
