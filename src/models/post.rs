use crate::models::UserSummary;
use crate::service::Record;
use crate::sql::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Uploaded image: public URL plus the store key needed to delete it later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub content: Option<String>,
    pub attachments: Json<Vec<Attachment>>,
    pub likes: Vec<Uuid>,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub deleted_by: Option<Uuid>,
    /// NULL while the post is live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const POSTS: Table = Table {
    name: "posts",
    columns: &[
        "id",
        "content",
        "attachments",
        "likes",
        "created_by",
        "updated_by",
        "deleted_by",
        "is_deleted",
        "created_at",
        "updated_at",
    ],
    primary_key: "id",
};

impl Record for Post {
    const TABLE: Table = POSTS;
}

/// Post with `created_by` and `likes` resolved to user summaries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: Option<String>,
    pub attachments: Vec<Attachment>,
    pub likes: Vec<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
