//! Typed error variants for the vdiff-config crate.
//!
//! `Settings::load` and `Settings::save` still return `anyhow::Result` for
//! application callers; these variants are what ends up inside the `anyhow`
//! error and can be recovered with `downcast_ref::<ConfigError>()`.

use thiserror::Error;

/// Errors that can occur when loading, saving or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the settings file.
    #[error("I/O error reading settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file contained invalid YAML that could not be parsed.
    #[error("YAML parse error in settings: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string names the field and why it is invalid.
    #[error("Settings validation error: {0}")]
    Validation(String),
}
