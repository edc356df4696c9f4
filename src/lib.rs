//! Render SVG documents through several rasterizer backends and compare each
//! result against a reference image.
//!
//! The engine is driven by [`coordinator::RenderCoordinator`]: one pass per
//! document, backends rendered concurrently, results cached and diffed.
//! Settings live in the `vdiff-config` crate and external programs are run
//! through `vdiff-process`.

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod cache;
pub mod cli;
pub mod coordinator;
pub mod corpus;
pub mod diff;
pub mod error;
pub mod events;
pub mod export;
pub mod raster;
pub mod renderer;
pub mod svg_size;
pub mod task_group;

pub use cache::{DiskCache, NoCache, RenderCache};
pub use coordinator::{CoordinatorState, DiffCoordinator, RenderCoordinator, RenderOutcome};
pub use diff::{DiffResult, DiffStats};
pub use error::{CacheError, CoordinatorError, RenderError};
pub use events::{EventLog, EventSink, ImageSource, NullSink, RenderEvent};
pub use raster::RasterSize;
pub use renderer::{Raster, RenderRequest, RenderResult};
pub use vdiff_config::{Backend, RenderSettings, Settings, TestSuite};
pub use vdiff_process::{ProcessError, ProcessRunner, SystemProcess};
