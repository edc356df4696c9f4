//! Logging for vdiff.
//!
//! Every `log::*!` call is routed to a session file, `vdiff_debug.log` in the
//! system temp directory, truncated at startup. When `RUST_LOG` is set the
//! same lines are mirrored to stderr.
//!
//! Level precedence: `--log-level` on the command line, then `RUST_LOG`, then
//! the `log_level` setting (applied with [`apply_settings_level`] once the
//! settings file has been read).

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const LOG_FILE_NAME: &str = "vdiff_debug.log";

/// Set when the level came from the command line or `RUST_LOG`; the
/// settings file then must not override it.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

static LOGGER: OnceLock<BridgeLogger> = OnceLock::new();

struct BridgeLogger {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl BridgeLogger {
    fn open(path: &Path, mirror_stderr: bool) -> Self {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .ok();
        let logger = Self {
            file: Mutex::new(file),
            mirror_stderr,
        };
        logger.write_line(&format!(
            "{}\nvdiff {} session started at {}\n{}",
            "=".repeat(80),
            crate::VERSION,
            timestamp(),
            "=".repeat(80)
        ));
        logger
    }

    fn write_line(&self, line: &str) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
        if self.mirror_stderr {
            eprintln!("{line}");
        }
    }
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.write_line(&format!(
            "[{}] [{:<5}] [{}] {}",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Path of the session log file.
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// Parse a `RUST_LOG` value. Only a bare level name is understood; module
/// directives fall back to `Info`.
fn level_from_env(value: &str) -> log::LevelFilter {
    value.trim().parse().unwrap_or(log::LevelFilter::Info)
}

/// Install the log bridge. Safe to call more than once; later calls only
/// adjust the level.
pub fn init_log_bridge(cli_level: Option<log::LevelFilter>) {
    let env_level = std::env::var("RUST_LOG").ok();
    let mirror_stderr = env_level.is_some();

    let level = match (cli_level, env_level.as_deref()) {
        (Some(level), _) => {
            LEVEL_PINNED.store(true, Ordering::Relaxed);
            level
        }
        (None, Some(value)) => {
            LEVEL_PINNED.store(true, Ordering::Relaxed);
            level_from_env(value)
        }
        (None, None) => log::LevelFilter::Warn,
    };

    let logger = LOGGER.get_or_init(|| BridgeLogger::open(&log_file_path(), mirror_stderr));
    // Fails only if another logger was installed first, e.g. by a test harness.
    let _ = log::set_logger(logger);
    log::set_max_level(level);
}

/// Apply the level from the settings file unless the command line or
/// `RUST_LOG` already chose one.
pub fn apply_settings_level(level: log::LevelFilter) {
    if !LEVEL_PINNED.load(Ordering::Relaxed) {
        log::set_max_level(level);
    }
}
