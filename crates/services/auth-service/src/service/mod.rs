//! Authentication service business logic.

mod auth_service;
mod tokens;

pub use auth_service::{AuthService, Authenticator, VerificationRequest};
pub use tokens::{Claims, IssuedToken, TokenCodec, TokenPair};
