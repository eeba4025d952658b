//! Logging setup.
//!
//! The `start` subcommand logs twice: a daily-rotated JSON file under the
//! configured logs directory for later inspection, and compact console
//! output on stderr for the operator. One-shot subcommands log to stderr
//! only. `RUST_LOG` overrides the default filter.

use std::io;
use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Fallback filter when `RUST_LOG` is unset: this crate at info,
/// dependencies at warn.
const DEFAULT_FILTER: &str = "sifter=info,warn";

/// File name prefix; the rolling appender adds the date suffix.
const LOG_FILE_PREFIX: &str = "sifter.log";

/// Keeps the non-blocking file writer flushing.
///
/// Dropping the guard flushes pending entries and closes the file, so the
/// binary holds it until shutdown.
pub struct LoggingGuard {
    _file: WorkerGuard,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Logging for the long-running service: JSON file plus console.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init_service(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(file_writer),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr),
        )
        .init();

    Ok(LoggingGuard { _file: guard })
}

/// Console-only logging for one-shot subcommands.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .init();
}
