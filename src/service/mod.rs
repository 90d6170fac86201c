pub mod crud;
pub mod validation;

pub use crud::*;
pub use validation::Validate;
