//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

fn env_filter() -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// initiate the global tracing subscriber
///
/// Events always go to stderr. When `log_file` is given they are mirrored to a
/// daily rolling file next to it; the returned guard must be held for as long
/// as the file should receive events.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let fmt_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    let mut appender_error = None;
    let (file_layer, guard) = match log_file.map(rolling_appender) {
        Some(Ok(appender)) => {
            let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
            let file_layer = layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter());
            (Some(file_layer), Some(file_guard))
        }
        Some(Err(e)) => {
            appender_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    registry().with(fmt_layer).with(file_layer).init();

    if let Some(e) = appender_error {
        tracing::warn!("Failed to create rolling log file, logging to stderr only: {e}");
    }

    guard
}

fn rolling_appender(log_file: &Path) -> Result<RollingFileAppender, String> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("invalid log file name: {}", log_file.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(3)
        .build(directory)
        .map_err(|e| e.to_string())
}
