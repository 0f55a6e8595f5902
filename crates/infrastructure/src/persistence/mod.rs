//! File-based persistence.

mod settings_repository;

pub use settings_repository::{
    IDENTITY_PROVIDER_ENV, SettingsError, SettingsRepository, apply_override,
};
