//! Authenticated identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Opaque identifier of an authenticated identity.
///
/// A principal is never empty. It stays stable for the lifetime of a
/// session and is used as the author of posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Creates a principal from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyPrincipal` if the value is blank.
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyPrincipal);
        }
        Ok(Self(value))
    }

    /// Returns the principal as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display (first 8 characters followed by `...`).
    #[must_use]
    pub fn short(&self) -> String {
        if self.0.chars().count() > 8 {
            let head: String = self.0.chars().take(8).collect();
            format!("{head}...")
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Principal {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejects_blank_principal() {
        assert_eq!(Principal::new(""), Err(DomainError::EmptyPrincipal));
        assert_eq!(Principal::new("   "), Err(DomainError::EmptyPrincipal));
    }

    #[test]
    fn test_short_preview() {
        let principal = Principal::new("rrkah-fqaaa-aaaaa-aaaaq-cai").unwrap();
        assert_eq!(principal.short(), "rrkah-fq...");

        let principal = Principal::new("alice").unwrap();
        assert_eq!(principal.short(), "alice");
    }

    #[test]
    fn test_serde_rejects_empty() {
        let parsed: Result<Principal, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());

        let parsed: Principal = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(parsed.as_str(), "bob");
    }
}
