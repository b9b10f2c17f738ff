//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 3;

/// Maximum password length accepted before hashing
pub const MAX_PASSWORD_LENGTH: usize = 80;

// =============================================================================
// Authentication
// =============================================================================

/// Default access token lifetime in minutes
pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 15;

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;

/// Default lifetime of email confirmation and password reset tokens in minutes
pub const DEFAULT_EMAIL_TOKEN_MINUTES: i64 = 15;

/// Upper bound on any configured token lifetime, in days
pub const MAX_TOKEN_LIFETIME_DAYS: i64 = 365;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Token type reported alongside issued token pairs
pub const TOKEN_TYPE_BEARER: &str = "bearer";

// =============================================================================
// Token scopes (wire names)
// =============================================================================

pub const SCOPE_ACCESS_TOKEN: &str = "access_token";
pub const SCOPE_REFRESH_TOKEN: &str = "refresh_token";
pub const SCOPE_CONFIRM_EMAIL: &str = "confirm_email";
pub const SCOPE_RESET_PASSWORD: &str = "reset_password";
