//! File logging for the explorer
//!
//! Stdout belongs to the TUI and to the NDJSON events of headless commands,
//! so every log line goes to a daily file under the local data directory.
//! `console.log` output of compiled callbacks is logged under the `callback`
//! target.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable overriding [`DEFAULT_FILTER`]
pub const LOG_ENV_VAR: &str = "SDKX_LOG";

/// Our crates and callback console lines at info, dependencies at warn
pub const DEFAULT_FILTER: &str =
    "sdk_explorer=info,explorer_core=info,explorer_app=info,explorer_tui=info,callback=info,warn";

const LOG_FILE_PREFIX: &str = "sdkx.log";

/// `<base>/sdk-explorer/logs`
pub fn log_directory_under(base: &Path) -> PathBuf {
    base.join("sdk-explorer").join("logs")
}

/// Log directory under the platform data dir, or the working directory
pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    log_directory_under(&base)
}

fn env_filter(from_env: Option<&str>) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the file subscriber; returns the log directory
///
/// ```bash
/// SDKX_LOG=debug sdkx
/// SDKX_LOG=callback=debug,warn sdkx call im.addListener
/// ```
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let from_env = std::env::var(LOG_ENV_VAR).ok();

    tracing_subscriber::registry()
        .with(env_filter(from_env.as_deref()))
        .with(
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(
        "sdk-explorer {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_dir.display()
    );
    Ok(log_dir)
}
