//! Settings persistence and path resolution.
//!
//! Covers:
//! - `load` / `save` against the XDG settings path
//! - `load_from` / `save_to` for explicit paths (atomic write)

use crate::error::ConfigError;
use crate::settings::Settings;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

impl Settings {
    /// Load settings from the default path, creating a default file if none
    /// exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::settings_path();
        log::info!("Settings path: {:?}", path);

        if path.exists() {
            Self::load_from(&path)
        } else {
            log::info!("Settings file not found, creating default at {:?}", path);
            let settings = Self::default();
            if let Err(e) = settings.save_to(&path) {
                log::error!("Failed to save default settings: {}", e);
                return Err(e);
            }
            Ok(settings)
        }
    }

    /// Load and validate settings from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read settings from {path:?}"))?;
        let settings: Settings = serde_yaml_ng::from_str(&contents)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to parse settings in {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    /// Save settings to an explicit file.
    ///
    /// Writes to a sibling temp file and renames it over the target so a crash
    /// mid-write never leaves a truncated settings file behind.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = self.to_yaml()?;

        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        Ok(())
    }

    /// Serialize to the YAML form used on disk.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Get the settings file path (using XDG convention)
    pub fn settings_path() -> PathBuf {
        Self::settings_dir().join("settings.yaml")
    }

    /// Get the settings directory path (using XDG convention)
    pub fn settings_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("vdiff")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // Use XDG convention on all platforms: ~/.config/vdiff/settings.yaml
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("vdiff")
            } else {
                PathBuf::from(".")
            }
        }
    }
}
