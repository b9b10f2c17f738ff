//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, DomainResult};

/// User domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Never serialized; cached copies come back with an empty hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(id: Uuid, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the email address as confirmed.
    ///
    /// Returns `false` if the user was already verified.
    pub fn mark_verified(&mut self) -> bool {
        if self.is_verified {
            return false;
        }
        self.is_verified = true;
        self.updated_at = Utc::now();
        true
    }

    /// Replace the stored password hash
    pub fn change_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

/// Registration input, validated before any hashing happens.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    /// User email address
    #[validate(email(message = "Invalid email address"), length(min = 5, max = 50))]
    pub email: String,
    /// Plain text password (3 to 80 characters)
    #[validate(length(min = 3, max = 80))]
    pub password: String,
}

impl Registration {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Run field validation, flattening failures into a domain error.
    pub fn check(&self) -> DomainResult<()> {
        self.validate()
            .map_err(|e| DomainError::validation(e.to_string()))
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address
    pub email: String,
    /// Whether the email address has been confirmed
    pub is_verified: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(Uuid::new_v4(), "a@x.com".to_string(), "$argon2id$hash".to_string())
    }

    #[test]
    fn test_new_user_is_unverified() {
        assert!(!sample().is_verified);
    }

    #[test]
    fn test_mark_verified_only_once() {
        let mut user = sample();
        assert!(user.mark_verified());
        assert!(user.is_verified);
        assert!(!user.mark_verified());
    }

    #[test]
    fn test_serialized_user_omits_password_hash() {
        let user = sample();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));

        let restored: User = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, user.id);
        assert!(restored.password_hash.is_empty());
    }

    #[test]
    fn test_registration_validation() {
        assert!(Registration::new("a@x.com", "pw1pw1").check().is_ok());
        assert!(Registration::new("not-an-email", "pw1pw1").check().is_err());
        assert!(Registration::new("a@x.com", "pw1").check().is_ok());
        assert!(Registration::new("a@x.com", "pw").check().is_err());
        assert!(Registration::new("a@x.com", "p".repeat(81)).check().is_err());
    }
}
