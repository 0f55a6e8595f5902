//! Client settings persistence.
//!
//! Stores settings in the platform-specific config directory:
//! - Linux/macOS: ~/.config/civitas/settings.json
//! - Windows: %APPDATA%/civitas/settings.json
//!
//! `CIVITAS_IDENTITY_PROVIDER_URL` overrides the stored provider URL.

use std::path::{Path, PathBuf};

use civitas_domain::{ClientSettings, DomainError};
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Environment variable overriding the identity provider URL.
pub const IDENTITY_PROVIDER_ENV: &str = "CIVITAS_IDENTITY_PROVIDER_URL";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// The configured identity provider URL is not usable.
    #[error("Invalid identity provider URL: {0}")]
    InvalidUrl(#[from] DomainError),
}

/// Repository for client settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository backed by the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir().map(|p| p.join("civitas").join("settings.json")),
        }
    }

    /// Creates a repository backed by an explicit file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the path where settings are stored, if available.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads settings, applying the environment override.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting provider URL is invalid.
    pub async fn load(&self) -> Result<ClientSettings, SettingsError> {
        self.load_with_override(std::env::var(IDENTITY_PROVIDER_ENV).ok())
            .await
    }

    /// Loads settings, applying `provider_url` in place of the environment.
    ///
    /// # Errors
    ///
    /// Same as [`SettingsRepository::load`].
    pub async fn load_with_override(
        &self,
        provider_url: Option<String>,
    ) -> Result<ClientSettings, SettingsError> {
        let stored = self.load_file().await?;
        let settings = apply_override(stored, provider_url);
        settings.provider_url()?;
        Ok(settings)
    }

    async fn load_file(&self) -> Result<ClientSettings, SettingsError> {
        let Some(path) = &self.path else {
            return Ok(ClientSettings::default());
        };

        if !fs::try_exists(path).await? {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(ClientSettings::default());
        }

        let content = fs::read(path).await?;
        Ok(from_json_bytes(&content)?)
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if no location is known or the write fails.
    pub async fn save(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(settings)?;
        fs::write(path, content).await?;

        Ok(())
    }
}

impl Default for SettingsRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a provider URL override, ignoring blank values.
#[must_use]
pub fn apply_override(mut settings: ClientSettings, provider_url: Option<String>) -> ClientSettings {
    if let Some(url) = provider_url.filter(|u| !u.trim().is_empty()) {
        settings.identity_provider_url = url.trim().to_string();
    }
    settings
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn default_path_is_under_civitas() {
        if let Some(p) = SettingsRepository::new().path() {
            assert!(p.ends_with("civitas/settings.json"));
        }
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempdir().expect("temp dir");
        let repo = SettingsRepository::with_path(dir.path().join("settings.json"));

        let settings = repo.load_file().await.unwrap();
        assert_eq!(settings, ClientSettings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempdir().expect("temp dir");
        let repo = SettingsRepository::with_path(dir.path().join("nested").join("settings.json"));
        let settings = ClientSettings::with_identity_provider("http://127.0.0.1:4943");

        repo.save(&settings).await.unwrap();
        let loaded = repo.load_file().await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{oops").unwrap();

        let result = SettingsRepository::with_path(path).load_file().await;
        assert!(matches!(result, Err(SettingsError::Serialization(_))));
    }

    #[tokio::test]
    async fn invalid_stored_provider_url_fails_load() {
        let dir = tempdir().expect("temp dir");
        let repo = SettingsRepository::with_path(dir.path().join("settings.json"));
        repo.save(&ClientSettings::with_identity_provider("ftp://x"))
            .await
            .unwrap();

        let result = repo.load_with_override(None).await;
        assert!(matches!(result, Err(SettingsError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn override_is_validated_on_load() {
        let dir = tempdir().expect("temp dir");
        let repo = SettingsRepository::with_path(dir.path().join("settings.json"));

        let settings = repo
            .load_with_override(Some("http://localhost:4943".to_string()))
            .await
            .unwrap();
        assert_eq!(settings.identity_provider_url, "http://localhost:4943");

        let result = repo.load_with_override(Some("not a url".to_string())).await;
        assert!(matches!(result, Err(SettingsError::InvalidUrl(_))));
    }

    #[test]
    fn override_replaces_provider_url() {
        let settings = apply_override(
            ClientSettings::default(),
            Some(" http://localhost:8080 ".to_string()),
        );
        assert_eq!(settings.identity_provider_url, "http://localhost:8080");

        let settings = apply_override(ClientSettings::default(), Some("  ".to_string()));
        assert_eq!(settings, ClientSettings::default());

        let settings = apply_override(ClientSettings::default(), None);
        assert_eq!(settings, ClientSettings::default());
    }
}
