//! Post handlers: list, read, create, update, freeze, unfreeze, like, unlike.

use crate::error::AppError;
use crate::extractors::{AuthUser, PostForm};
use crate::models::{Attachment, Post, PostView, Role, UserSummary};
use crate::response::{success_created, success_ok};
use crate::service::validation::object_id;
use crate::service::Repository;
use crate::sql::{BindValue, Filter, Patch};
use crate::state::AppState;
use crate::storage::UploadedFile;
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Roles allowed per endpoint.
pub mod endpoint {
    use crate::models::Role;

    pub const READ_POSTS: &[Role] = &[Role::User, Role::Admin];
    pub const CREATE_POST: &[Role] = &[Role::User];
    pub const UPDATE_POST: &[Role] = &[Role::User];
    pub const FREEZE_POST: &[Role] = &[Role::User, Role::Admin];
    pub const UNFREEZE_POST: &[Role] = &[Role::User, Role::Admin];
    pub const LIKE_POST: &[Role] = &[Role::User, Role::Admin];
}

const NEWEST_FIRST: &str = "\"created_at\" DESC";

fn not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

/// Live (not frozen) post by id.
fn live_post(post_id: Uuid) -> Filter {
    Filter::new().eq("id", post_id).missing("is_deleted")
}

/// Users may freeze their own posts; admins may freeze any post.
pub fn freeze_filter(post_id: Uuid, caller_id: Uuid, role: Role) -> Filter {
    match role {
        Role::Admin => live_post(post_id),
        Role::User => live_post(post_id).eq("created_by", caller_id),
    }
}

/// Only whoever froze a post can bring it back.
pub fn unfreeze_filter(post_id: Uuid, caller_id: Uuid) -> Filter {
    Filter::new()
        .eq("id", post_id)
        .exists("is_deleted")
        .eq("deleted_by", caller_id)
}

/// Resolve `created_by` and `likes` against the loaded user summaries. Unknown ids are dropped.
pub fn assemble(posts: Vec<Post>, users: &HashMap<Uuid, UserSummary>) -> Vec<PostView> {
    posts
        .into_iter()
        .map(|p| PostView {
            id: p.id,
            content: p.content,
            likes: p.likes.iter().filter_map(|id| users.get(id).cloned()).collect(),
            created_by: users.get(&p.created_by).cloned(),
            attachments: p.attachments.0,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect()
}

async fn populate(state: &AppState, posts: Vec<Post>) -> Result<Vec<PostView>, AppError> {
    let mut ids: Vec<Uuid> = posts
        .iter()
        .flat_map(|p| std::iter::once(p.created_by).chain(p.likes.iter().copied()))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let users: HashMap<Uuid, UserSummary> = Repository::find_by_ids::<UserSummary>(&state.pool, &ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    Ok(assemble(posts, &users))
}

fn attachments_value(attachments: &[Attachment]) -> Result<BindValue, AppError> {
    serde_json::to_value(attachments)
        .map(BindValue::Json)
        .map_err(|e| AppError::Internal(format!("attachments: {}", e)))
}

/// Remove stored objects off the request path; failures are only logged.
fn discard_attachments(state: &AppState, attachments: Vec<Attachment>) {
    if attachments.is_empty() {
        return;
    }
    let storage = state.storage.clone();
    tokio::spawn(async move {
        for a in attachments {
            if let Err(e) = storage.delete(&a.public_id).await {
                tracing::warn!(public_id = %a.public_id, error = %e, "attachment cleanup failed");
            }
        }
    });
}

async fn upload_attachments(
    state: &AppState,
    user_id: Uuid,
    files: Vec<UploadedFile>,
) -> Result<Vec<Attachment>, AppError> {
    let folder = format!("{}/user/{}/posts", state.settings.app_name, user_id);
    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        match state.storage.upload(&folder, file).await {
            Ok(a) => uploaded.push(a),
            Err(e) => {
                discard_attachments(state, uploaded);
                return Err(e);
            }
        }
    }
    Ok(uploaded)
}

/// GET /post
pub async fn list_posts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::READ_POSTS)?;
    let posts: Vec<Post> = Repository::find(&state.pool, &Filter::new().missing("is_deleted"), Some(NEWEST_FIRST)).await?;
    if posts.is_empty() {
        return Err(AppError::NotFound("There are no posts".into()));
    }
    let posts = populate(&state, posts).await?;
    Ok(success_ok(
        "Posts retrieved successfully",
        serde_json::json!({ "posts": posts }),
    ))
}

/// GET /post/:postId
pub async fn get_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::READ_POSTS)?;
    let post_id = object_id("postId", &post_id)?;
    let post: Post = Repository::find_one(&state.pool, &live_post(post_id))
        .await?
        .ok_or_else(not_found)?;
    let post = populate(&state, vec![post]).await?.pop().ok_or_else(not_found)?;
    Ok(success_ok(
        "Post retrieved successfully",
        serde_json::json!({ "post": post }),
    ))
}

/// POST /post (multipart)
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::CREATE_POST)?;
    let form = PostForm::from_multipart(multipart).await?;
    if form.is_empty() {
        return Err(AppError::Validation("content or attachment is required".into()));
    }
    let attachments = upload_attachments(&state, auth.id(), form.files).await?;
    let mut values: Vec<(&'static str, BindValue)> = vec![
        ("attachments", attachments_value(&attachments)?),
        ("created_by", auth.id().into()),
    ];
    if let Some(content) = form.content.filter(|c| !c.is_empty()) {
        values.push(("content", content.into()));
    }
    let post: Post = match Repository::create(&state.pool, &values).await {
        Ok(p) => p,
        Err(e) => {
            discard_attachments(&state, attachments);
            return Err(e);
        }
    };
    tracing::info!(post_id = %post.id, user_id = %auth.id(), attachments = post.attachments.0.len(), "post created");
    Ok(success_created("Post created successfully", post))
}

/// Content changes of an update: a blank `content` field clears the text.
/// The post must keep content or at least one attachment.
pub fn content_patch(patch: Patch, form: &PostForm, existing: &Post) -> Result<Patch, AppError> {
    let keeps_attachments = !form.files.is_empty() || !existing.attachments.0.is_empty();
    match form.content.as_deref() {
        Some("") if !keeps_attachments => Err(AppError::Validation(
            "content or attachment is required".into(),
        )),
        Some("") => Ok(patch.unset("content")),
        Some(text) => Ok(patch.set("content", text)),
        None => Ok(patch),
    }
}

/// PATCH /post/:postId (multipart). Only the author may update a live post.
/// An empty form only stamps `updated_by`.
pub async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::UPDATE_POST)?;
    let post_id = object_id("postId", &post_id)?;
    let filter = live_post(post_id).eq("created_by", auth.id());
    let form = PostForm::from_multipart(multipart).await?;
    let existing: Post = Repository::find_one(&state.pool, &filter)
        .await?
        .ok_or_else(not_found)?;

    let mut patch = content_patch(Patch::new(), &form, &existing)?.set("updated_by", auth.id());
    let replaced = !form.files.is_empty();
    let mut uploaded = Vec::new();
    if replaced {
        uploaded = upload_attachments(&state, auth.id(), form.files).await?;
        patch = patch.set("attachments", attachments_value(&uploaded)?);
    }

    match Repository::find_one_and_update::<Post>(&state.pool, &filter, &patch).await {
        Ok(Some(post)) => {
            if replaced {
                discard_attachments(&state, existing.attachments.0);
            }
            Ok(success_ok("Post updated successfully", post))
        }
        Ok(None) => {
            discard_attachments(&state, uploaded);
            Err(not_found())
        }
        Err(e) => {
            discard_attachments(&state, uploaded);
            Err(e)
        }
    }
}

/// DELETE /post/:postId: soft-delete.
pub async fn freeze_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::FREEZE_POST)?;
    let post_id = object_id("postId", &post_id)?;
    let patch = Patch::new()
        .set("is_deleted", true)
        .set("deleted_by", auth.id())
        .set("updated_by", auth.id());
    let post: Post = Repository::find_one_and_update(&state.pool, &freeze_filter(post_id, auth.id(), auth.role()), &patch)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(post_id = %post.id, user_id = %auth.id(), "post frozen");
    Ok(success_ok("Post freezed successfully", post))
}

/// PATCH /post/:postId/unfreeze
pub async fn unfreeze_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::UNFREEZE_POST)?;
    let post_id = object_id("postId", &post_id)?;
    let patch = Patch::new()
        .unset("is_deleted")
        .unset("deleted_by")
        .set("updated_by", auth.id());
    let post: Post = Repository::find_one_and_update(&state.pool, &unfreeze_filter(post_id, auth.id()), &patch)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(post_id = %post.id, user_id = %auth.id(), "post unfrozen");
    Ok(success_ok("Post unfreezed successfully", post))
}

/// PATCH /post/:postId/like
pub async fn like_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::LIKE_POST)?;
    let post_id = object_id("postId", &post_id)?;
    let liked = live_post(post_id).contains("likes", auth.id());
    if Repository::find_one::<Post>(&state.pool, &liked).await?.is_some() {
        return Err(AppError::Conflict("Post already liked".into()));
    }
    let patch = Patch::new().add_to_set("likes", auth.id());
    let post: Post = Repository::find_one_and_update(&state.pool, &live_post(post_id), &patch)
        .await?
        .ok_or_else(not_found)?;
    Ok(success_ok("Post liked successfully", post))
}

/// PATCH /post/:postId/unlike
pub async fn unlike_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth.require(endpoint::LIKE_POST)?;
    let post_id = object_id("postId", &post_id)?;
    let patch = Patch::new().pull("likes", auth.id());
    let post: Post = Repository::find_one_and_update(&state.pool, &live_post(post_id), &patch)
        .await?
        .ok_or_else(not_found)?;
    Ok(success_ok("Post unliked successfully", post))
}
