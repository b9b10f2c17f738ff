//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Types here are shared by the auth service and any route layer built on it.

pub mod constants;
pub mod error;
pub mod password;
pub mod token;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::Password;
pub use token::TokenScope;
pub use user::{Registration, User, UserResponse};
