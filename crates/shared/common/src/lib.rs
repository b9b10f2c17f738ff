//! Common utilities shared across the auth workspace.
//!
//! This crate provides:
//! - Unified error handling with HTTP response mapping
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
