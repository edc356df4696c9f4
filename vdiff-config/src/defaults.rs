//! Default value functions for settings.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! [`crate::Settings`] fields.

use crate::backend::Backend;
use crate::settings::BackendSettings;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub fn bool_true() -> bool {
    true
}

pub fn view_size() -> u32 {
    240
}

pub fn dpi_scale() -> f64 {
    1.0
}

/// Zero means "use the available parallelism".
pub fn workers() -> usize {
    0
}

pub fn java_program() -> String {
    "java".to_string()
}

pub fn tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

pub fn custom_tests_dir() -> PathBuf {
    PathBuf::from("custom-tests")
}

/// Working directory for temporary rasterizer output and the render cache.
pub fn work_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("vdiff"))
        .unwrap_or_else(|| PathBuf::from(".vdiff"))
}

/// Every external backend, enabled, with no rasterizer path configured yet.
pub fn backends() -> BTreeMap<Backend, BackendSettings> {
    Backend::external()
        .iter()
        .map(|b| (*b, BackendSettings::default()))
        .collect()
}
