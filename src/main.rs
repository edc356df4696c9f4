use anyhow::Result;
use clap::Parser;
use vdiff::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI --log-level takes precedence, then RUST_LOG, then the settings file
    // (applied once it has been loaded).
    vdiff::debug::init_log_bridge(cli.log_level.map(|level| level.to_level_filter()));
    log::info!("Starting vdiff {}", vdiff::VERSION);

    let result = cli::execute(cli);
    if let Err(ref e) = result {
        log::error!("vdiff failed: {e:#}");
        eprintln!("vdiff: error: {e:#}");
    }
    result
}
