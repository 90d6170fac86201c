//! /post routes. Path ids are parsed in the handlers so bad ids get the error envelope.

use crate::handlers::post::{
    create_post, freeze_post, get_post, like_post, list_posts, unfreeze_post, unlike_post, update_post,
};
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn post_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/:postId",
            get(get_post).patch(update_post).delete(freeze_post),
        )
        .route("/:postId/unfreeze", patch(unfreeze_post))
        .route("/:postId/like", patch(like_post))
        .route("/:postId/unlike", patch(unlike_post))
        .with_state(state)
}
