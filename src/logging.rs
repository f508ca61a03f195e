use std::env;
use std::path::Path;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE_PATH: &str = "./logs/share-migrator.log";

/// Log to stdout and to `LOG_FILE_PATH`. Keep the guard alive until exit
/// so the file writer gets flushed.
pub fn init_logger(debug: bool) -> Option<WorkerGuard> {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE_PATH.to_string());
    let (file_layer, guard, file_error) = match file_appender(Path::new(&log_file_path)) {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking) // Log to file
                .with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Err(err) => (None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout) // Log to stdout
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    match file_error {
        None => debug!("Logging to stdout and {}", log_file_path),
        Some(err) => warn!("Cannot log to {}: {}", log_file_path, err),
    }

    guard
}

fn file_appender(
    path: &Path,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "share-migrator.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}
