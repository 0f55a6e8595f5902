//! Client Settings Domain Model
//!
//! Externally supplied configuration for the feed client.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Identity provider used when no other URL is configured.
pub const DEFAULT_IDENTITY_PROVIDER_URL: &str = "https://identity.ic0.app";

/// Settings for the feed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Where the login redirect flow is sent.
    #[serde(default = "default_identity_provider_url")]
    pub identity_provider_url: String,
}

fn default_identity_provider_url() -> String {
    DEFAULT_IDENTITY_PROVIDER_URL.to_string()
}

impl ClientSettings {
    /// Creates settings pointing at the given identity provider.
    #[must_use]
    pub fn with_identity_provider(url: impl Into<String>) -> Self {
        Self {
            identity_provider_url: url.into(),
        }
    }

    /// Parses the configured identity provider URL.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the setting is not an absolute
    /// `http` or `https` URL.
    pub fn provider_url(&self) -> DomainResult<Url> {
        let raw = &self.identity_provider_url;
        let url = Url::parse(raw).map_err(|e| DomainError::InvalidUrl(format!("{raw}: {e}")))?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(url),
            other => Err(DomainError::InvalidUrl(format!(
                "{raw}: identity provider must be http(s), got '{other}'"
            ))),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            identity_provider_url: default_identity_provider_url(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.identity_provider_url, "https://identity.ic0.app");
        assert_eq!(
            settings.provider_url().unwrap().host_str(),
            Some("identity.ic0.app")
        );
    }

    #[test]
    fn missing_field_falls_back_to_default() {
        let settings: ClientSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn invalid_provider_url() {
        let settings = ClientSettings::with_identity_provider("identity");
        assert!(matches!(
            settings.provider_url(),
            Err(DomainError::InvalidUrl(_))
        ));

        let settings = ClientSettings::with_identity_provider("ftp://identity.example");
        assert!(matches!(
            settings.provider_url(),
            Err(DomainError::InvalidUrl(_))
        ));
    }
}
