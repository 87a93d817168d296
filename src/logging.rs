use std::path::Path;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sends logs to a file, since the terminal belongs to the UI. `RUST_LOG`
/// overrides `default_level`. Keep the guard alive until exit so buffered
/// lines get flushed.
///
/// Returns `None` when the log file cannot be opened; the app then runs
/// without logging.
pub fn init(dir: &Path, file_name: &str, default_level: &str) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init();

    Some(guard)
}
