//! Password value object - Domain layer password handling.
//!
//! Passwords are only ever held as Argon2 PHC strings; the plain text never
//! leaves this module.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{DomainError, DomainResult};

/// Hash that never verifies, used to keep login timing uniform for
/// unknown accounts.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$0Kp5vbxV7J0qb8mRk4cX3TNmT6yA0p2nK3nUeqGf1hQ";

/// Password value object that handles hashing and verification.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns a password error if the length is outside
    /// `MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH`.
    pub fn new(plain_text: &str) -> DomainResult<Self> {
        Self::check_length(plain_text)?;
        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Create a Password from an existing hash (from the credential store).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Placeholder hash for accounts that do not exist.
    pub fn dummy() -> Self {
        Self::from_hash(DUMMY_HASH)
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// A malformed stored hash never verifies.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    /// Enforce the length policy without hashing.
    pub fn check_length(plain_text: &str) -> DomainResult<()> {
        let len = plain_text.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(DomainError::password(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(DomainError::password(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    fn hash(plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_hash(plain_text: &str, hash: &str) -> DomainResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DomainError::internal(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "SecurePassword123!";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_password_from_hash() {
        let plain = "TestPassword123";
        let password = Password::new(plain).unwrap();
        let hash = password.as_str().to_string();

        let restored = Password::from_hash(hash);
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_same_password_different_salts() {
        let plain = "SamePassword123";
        let pass1 = Password::new(plain).unwrap();
        let pass2 = Password::new(plain).unwrap();

        assert_ne!(pass1.as_str(), pass2.as_str());
        assert!(pass1.verify(plain));
        assert!(pass2.verify(plain));
    }

    #[test]
    fn test_hash_never_contains_plain_text() {
        let plain = "pw1-secret";
        let password = Password::new(plain).unwrap();
        assert!(!password.as_str().contains(plain));
        assert!(password.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(Password::new("pw"), Err(DomainError::Password(_))));
        assert!(Password::new("pw1").is_ok());
        assert!(Password::new(&"x".repeat(MAX_PASSWORD_LENGTH)).is_ok());
        assert!(Password::new(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_dummy_and_malformed_hashes_never_verify() {
        assert!(!Password::dummy().verify("anything"));
        assert!(!Password::from_hash("not-a-phc-string").verify("anything"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let password = Password::from_hash("$argon2id$secret");
        assert!(!format!("{:?}", password).contains("secret"));
    }
}
