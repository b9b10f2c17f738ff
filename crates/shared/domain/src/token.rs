//! Token scopes.
//!
//! Every signed token carries exactly one scope; a token is only accepted by
//! the operation its scope names.

use serde::{Deserialize, Serialize};

use crate::constants::{
    SCOPE_ACCESS_TOKEN, SCOPE_CONFIRM_EMAIL, SCOPE_REFRESH_TOKEN, SCOPE_RESET_PASSWORD,
};
use crate::error::DomainError;

/// Purpose a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
    ConfirmEmail,
    ResetPassword,
}

impl TokenScope {
    /// Wire name of the scope
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::AccessToken => SCOPE_ACCESS_TOKEN,
            TokenScope::RefreshToken => SCOPE_REFRESH_TOKEN,
            TokenScope::ConfirmEmail => SCOPE_CONFIRM_EMAIL,
            TokenScope::ResetPassword => SCOPE_RESET_PASSWORD,
        }
    }

    /// Suffix of the per-subject cache key that tracks the live token of
    /// this scope. Email confirmation tokens are stateless.
    pub fn cache_slot(&self) -> Option<&'static str> {
        match self {
            TokenScope::AccessToken => Some("access"),
            TokenScope::RefreshToken => Some("refresh"),
            TokenScope::ResetPassword => Some("reset"),
            TokenScope::ConfirmEmail => None,
        }
    }
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SCOPE_ACCESS_TOKEN => Ok(TokenScope::AccessToken),
            SCOPE_REFRESH_TOKEN => Ok(TokenScope::RefreshToken),
            SCOPE_CONFIRM_EMAIL => Ok(TokenScope::ConfirmEmail),
            SCOPE_RESET_PASSWORD => Ok(TokenScope::ResetPassword),
            other => Err(DomainError::token(format!("unknown scope '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_wire_names_match_serde() {
        for scope in [
            TokenScope::AccessToken,
            TokenScope::RefreshToken,
            TokenScope::ConfirmEmail,
            TokenScope::ResetPassword,
        ] {
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope.as_str()));
            assert_eq!(scope.as_str().parse::<TokenScope>().unwrap(), scope);
        }
    }

    #[test]
    fn test_unknown_scope_rejected() {
        assert!("session".parse::<TokenScope>().is_err());
        assert!(serde_json::from_str::<TokenScope>("\"session\"").is_err());
    }

    #[test]
    fn test_confirm_email_has_no_cache_slot() {
        assert_eq!(TokenScope::ConfirmEmail.cache_slot(), None);
        assert_eq!(TokenScope::AccessToken.cache_slot(), Some("access"));
        assert_eq!(TokenScope::RefreshToken.cache_slot(), Some("refresh"));
        assert_eq!(TokenScope::ResetPassword.cache_slot(), Some("reset"));
    }
}
