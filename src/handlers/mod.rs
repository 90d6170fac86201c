//! HTTP handlers for auth, user profile and posts.

pub mod auth;
pub mod post;
pub mod user;
