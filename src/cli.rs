//! Command-line interface for vdiff.
//!
//! Parses arguments with clap and runs the selected subcommand. Every
//! subcommand works on the settings file (default location or `--config`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::cache::DiskCache;
use crate::coordinator::{RenderCoordinator, RenderOutcome};
use crate::error::CoordinatorError;
use crate::events::{ImageSource, RenderEvent};
use crate::{corpus, export};
use vdiff_config::{LogLevel, RenderSettings, Settings, TestSuite};
use vdiff_process::SystemProcess;

/// vdiff - Compare SVG rasterizers against reference images
#[derive(Parser)]
#[command(name = "vdiff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set log level (overrides RUST_LOG and the settings file)
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Off => LogLevel::Off,
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

impl LogLevelArg {
    pub fn to_level_filter(self) -> log::LevelFilter {
        LogLevel::from(self).to_level_filter()
    }
}

/// Test suite argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SuiteArg {
    Results,
    Custom,
}

impl From<SuiteArg> for TestSuite {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Results => TestSuite::Results,
            SuiteArg::Custom => TestSuite::Custom,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one document through every enabled backend
    Render {
        /// Document to render
        document: PathBuf,

        /// Write renders and diffs into this directory
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Test suite the document belongs to
        #[arg(long, value_enum)]
        suite: Option<SuiteArg>,

        /// Edge of the square render viewport in pixels
        #[arg(long, value_name = "N")]
        view_size: Option<u32>,
    },

    /// Render every document of the active test suite, one after another
    Run {
        /// Write renders and diffs into this directory
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Test suite to run
        #[arg(long, value_enum)]
        suite: Option<SuiteArg>,
    },

    /// Manage the render cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove every cached render
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings as YAML
    Show,
    /// Print the settings file path
    Path,
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::settings_path)
    }

    fn load_settings(&self) -> Result<Settings> {
        match &self.config {
            Some(path) => Settings::load_from(path),
            None => Settings::load(),
        }
    }
}

/// Run the parsed command line to completion.
pub fn execute(cli: Cli) -> Result<()> {
    if let Commands::Config {
        command: ConfigCommand::Path,
    } = &cli.command
    {
        println!("{}", cli.settings_path().display());
        return Ok(());
    }

    let mut settings = cli.load_settings()?;
    crate::debug::apply_settings_level(settings.log_level.to_level_filter());

    match cli.command {
        Commands::Render {
            document,
            out,
            suite,
            view_size,
        } => {
            apply_overrides(&mut settings, suite, view_size)?;
            let runtime = Runtime::new()?;
            let coordinator = coordinator_for(&settings);
            let outcome = render_one(&runtime, &coordinator, &settings, &document)?;
            if let Some(out) = out {
                export::write_outcome(&out, &outcome)?;
            }
            Ok(())
        }
        Commands::Run { out, suite } => {
            apply_overrides(&mut settings, suite, None)?;
            run_suite(&settings, out.as_deref())
        }
        Commands::Cache {
            command: CacheCommand::Clear,
        } => {
            let cache = DiskCache::in_work_dir(&settings.work_dir);
            let removed = cache.clear()?;
            println!("Removed {} cached renders from {}", removed, cache.dir().display());
            Ok(())
        }
        Commands::Config {
            command: ConfigCommand::Show,
        } => {
            let yaml = settings.to_yaml().context("Failed to serialize settings")?;
            print!("{yaml}");
            Ok(())
        }
        Commands::Config {
            command: ConfigCommand::Path,
        } => Ok(()),
    }
}

fn apply_overrides(
    settings: &mut Settings,
    suite: Option<SuiteArg>,
    view_size: Option<u32>,
) -> Result<()> {
    if let Some(suite) = suite {
        settings.test_suite = suite.into();
    }
    if let Some(view_size) = view_size {
        settings.view_size = view_size;
    }
    settings.validate()?;
    Ok(())
}

fn coordinator_for(settings: &Settings) -> RenderCoordinator {
    RenderCoordinator::new(
        Arc::new(DiskCache::in_work_dir(&settings.work_dir)),
        Arc::new(SystemProcess),
    )
}

/// Run one pass and print a line per backend as its events arrive.
fn render_one(
    runtime: &Runtime,
    coordinator: &RenderCoordinator,
    settings: &Settings,
    document: &Path,
) -> Result<RenderOutcome> {
    println!("{}", corpus::base_name(document));
    run_pass(runtime, coordinator, &settings.snapshot(), document, print_event)
        .with_context(|| format!("Failed to render {:?}", document))
}

/// Drive one pass to completion, handing each event to `on_event` while the
/// pass is still running.
fn run_pass(
    runtime: &Runtime,
    coordinator: &RenderCoordinator,
    settings: &RenderSettings,
    document: &Path,
    mut on_event: impl FnMut(RenderEvent),
) -> Result<RenderOutcome, CoordinatorError> {
    let (sender, mut receiver) = mpsc::unbounded_channel();

    runtime.block_on(async {
        let pass = async move {
            let outcome = coordinator.render(document, settings, &sender).await;
            // Closing the channel ends the consumer below.
            drop(sender);
            outcome
        };
        let consumer = async {
            while let Some(event) = receiver.recv().await {
                on_event(event);
            }
        };
        let (outcome, ()) = tokio::join!(pass, consumer);
        outcome
    })
}

fn print_event(event: RenderEvent) {
    match event {
        RenderEvent::ImageReady {
            backend,
            source,
            placeholder,
            ..
        } => {
            let state = match (source, placeholder) {
                (_, true) => "failed",
                (ImageSource::Cached, false) => "cached",
                (ImageSource::Rendered, false) => "ready",
            };
            println!("  {:<14} {}", backend.display_name(), state);
        }
        RenderEvent::DiffReady { backend, stats, .. } => {
            println!(
                "  {:<14} diff {:.2}% ({} of {} px)",
                backend.display_name(),
                stats.percent(),
                stats.differing_pixels,
                stats.total_pixels()
            );
        }
        RenderEvent::AllRendered { .. } | RenderEvent::AllDiffed { .. } => {}
    }
}

fn run_suite(settings: &Settings, out: Option<&Path>) -> Result<()> {
    let root = settings.tests_path();
    let documents = corpus::discover(root)
        .with_context(|| format!("Failed to read test directory {:?}", root))?;
    log::info!(
        "Running {} suite: {} documents",
        settings.test_suite.display_name(),
        documents.len()
    );

    let runtime = Runtime::new()?;
    let coordinator = coordinator_for(settings);

    let mut placeholders = 0;
    let mut cache_hits = 0;
    let mut identical = 0;
    for document in &documents {
        let outcome = render_one(&runtime, &coordinator, settings, document)?;
        placeholders += outcome
            .renders
            .values()
            .filter(|result| result.is_placeholder())
            .count();
        cache_hits += outcome.cache_hits;
        identical += outcome
            .diffs
            .values()
            .filter(|diff| diff.stats.is_identical())
            .count();

        if let Some(out) = out {
            let relative = document.strip_prefix(root).unwrap_or(document);
            let target = match relative.parent() {
                Some(parent) => out.join(parent),
                None => out.to_path_buf(),
            };
            export::write_outcome(&target, &outcome)?;
        }
    }

    println!(
        "{} documents, {} cache hits, {} failed renders, {} identical to reference",
        documents.len(),
        cache_hits,
        placeholders,
        identical
    );
    Ok(())
}
