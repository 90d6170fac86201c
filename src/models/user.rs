//! User documents and the public views derived from them.

use crate::service::Record;
use crate::sql::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s)),
        }
    }
}

#[derive(Clone, Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 hash.
    pub password: String,
    pub phone_number: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub confirm_email: bool,
    pub confirm_email_otp: Option<String>,
    pub reset_password_otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub reset_code_verified: bool,
    pub change_credentials_time: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const USERS: Table = Table {
    name: "users",
    columns: &[
        "id",
        "username",
        "email",
        "password",
        "phone_number",
        "role",
        "confirm_email",
        "confirm_email_otp",
        "reset_password_otp",
        "otp_expires_at",
        "reset_code_verified",
        "change_credentials_time",
        "image",
        "created_at",
        "updated_at",
    ],
    primary_key: "id",
};

impl Record for User {
    const TABLE: Table = USERS;
}

/// What a user sees about themselves: no hashes, no codes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub confirm_email: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        UserProfile {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            phone_number: u.phone_number.clone(),
            role: u.role,
            confirm_email: u.confirm_email,
            image: u.image.clone(),
            created_at: u.created_at,
        }
    }
}

/// Populated reference to a user (post author, likers).
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub image: Option<String>,
}

impl Record for UserSummary {
    const TABLE: Table = Table {
        name: "users",
        columns: &["id", "username", "image"],
        primary_key: "id",
    };
}
