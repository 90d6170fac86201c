//! Request extractors: authenticated caller, validated JSON bodies, multipart post forms.

pub mod auth;
pub mod body;
pub mod upload;

pub use auth::AuthUser;
pub use body::ValidBody;
pub use upload::PostForm;
