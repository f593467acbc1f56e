//! Tracing setup: a log file in the project cache plus optional stderr.

use std::path::Path;

use ember_cache::LOG_FILE;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::GlobalArgs;

/// Installs the global subscriber.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, falling
/// back to `info`. Stderr only shows warnings and errors unless verbose;
/// `--quiet` removes it entirely. The file always gets everything enabled.
/// The returned guard must live until exit so buffered lines are written.
pub fn init_logging(
    cache_dir: &Path,
    global: &GlobalArgs,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(cache_dir)?;
    let file_appender = tracing_appender::rolling::never(cache_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if global.quiet {
        registry.try_init()?;
    } else {
        let stderr_level = if global.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(stderr_level);
        registry.with(stderr_layer).try_init()?;
    }

    Ok(guard)
}
