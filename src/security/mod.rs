//! Password hashing, one-time codes and JWTs.

pub mod otp;
pub mod password;
pub mod token;

pub use otp::{check_otp, generate_otp};
pub use password::{hash_secret, verify_secret};
pub use token::{Claims, TokenKeys, TokenKind, TokenPair};
