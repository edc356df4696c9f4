//! Configuration system for the vdiff render comparison tool.
//!
//! This crate provides settings loading, saving, and default values. It includes:
//!
//! - The closed [`Backend`] set and per-backend invocation settings
//! - Test-suite selection (curated regression suite vs ad-hoc corpus)
//! - YAML persistence with atomic writes
//! - Immutable [`RenderSettings`] snapshots consumed by the render engine

pub mod backend;
pub mod defaults;
pub mod error;
pub mod settings;
pub mod snapshot;
mod persistence;
mod types;

pub use backend::Backend;
pub use error::ConfigError;
pub use settings::{BackendSettings, Settings};
pub use snapshot::{BackendInvocation, RenderSettings};
pub use types::{LogLevel, TestSuite};
