//! Database documents: users and posts.

pub mod post;
pub mod user;

pub use post::*;
pub use user::*;
