//! The persisted settings model.

use crate::backend::Backend;
use crate::error::ConfigError;
use crate::types::{LogLevel, TestSuite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Invocation settings for one external rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Whether the backend takes part in render passes.
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,

    /// Path to the rasterizer entry point (a runnable `.jar`).
    #[serde(default)]
    pub path: PathBuf,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::new(),
        }
    }
}

/// Application settings, stored as YAML.
///
/// The render engine never reads this type directly; it receives an
/// immutable [`crate::RenderSettings`] built by [`Settings::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Active corpus.
    #[serde(default)]
    pub test_suite: TestSuite,

    /// Root of the curated regression suite.
    #[serde(default = "crate::defaults::tests_dir")]
    pub tests_dir: PathBuf,

    /// Root of the ad-hoc corpus.
    #[serde(default = "crate::defaults::custom_tests_dir")]
    pub custom_tests_dir: PathBuf,

    /// Temporary rasterizer output and render cache live here.
    #[serde(default = "crate::defaults::work_dir")]
    pub work_dir: PathBuf,

    /// Edge length of the square view, in logical pixels.
    #[serde(default = "crate::defaults::view_size")]
    pub view_size: u32,

    /// Multiplier applied to `view_size` for HiDPI output.
    #[serde(default = "crate::defaults::dpi_scale")]
    pub dpi_scale: f64,

    /// Worker pool size; 0 uses the available parallelism.
    #[serde(default = "crate::defaults::workers")]
    pub workers: usize,

    /// Runtime used to start the Java rasterizers.
    #[serde(default = "crate::defaults::java_program")]
    pub java_program: String,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Per-backend invocation settings, keyed by stable backend name.
    #[serde(default = "crate::defaults::backends")]
    pub backends: BTreeMap<Backend, BackendSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_suite: TestSuite::default(),
            tests_dir: crate::defaults::tests_dir(),
            custom_tests_dir: crate::defaults::custom_tests_dir(),
            work_dir: crate::defaults::work_dir(),
            view_size: crate::defaults::view_size(),
            dpi_scale: crate::defaults::dpi_scale(),
            workers: crate::defaults::workers(),
            java_program: crate::defaults::java_program(),
            log_level: LogLevel::default(),
            backends: crate::defaults::backends(),
        }
    }
}

impl Settings {
    /// Settings for `backend`, falling back to the defaults when the file
    /// omits it.
    pub fn backend(&self, backend: Backend) -> BackendSettings {
        self.backends.get(&backend).cloned().unwrap_or_default()
    }

    pub fn backend_mut(&mut self, backend: Backend) -> &mut BackendSettings {
        self.backends.entry(backend).or_default()
    }

    /// Root directory of the active corpus.
    pub fn tests_path(&self) -> &PathBuf {
        match self.test_suite {
            TestSuite::Results => &self.tests_dir,
            TestSuite::Custom => &self.custom_tests_dir,
        }
    }

    /// Reject values the render engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_size == 0 {
            return Err(ConfigError::Validation(
                "view_size must be greater than zero".to_string(),
            ));
        }
        if !self.dpi_scale.is_finite() || self.dpi_scale <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "dpi_scale must be a positive number, got {}",
                self.dpi_scale
            )));
        }
        if self.backends.contains_key(&Backend::Reference) {
            return Err(ConfigError::Validation(
                "the reference backend has no invocation settings".to_string(),
            ));
        }
        if self.java_program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "java_program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// View size after applying the HiDPI scale.
    pub fn effective_view_size(&self) -> u32 {
        ((self.view_size as f64) * self.dpi_scale).round().max(1.0) as u32
    }
}
