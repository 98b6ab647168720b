//! Logging Infrastructure
//!
//! Console logging by default, a daily rolling file when a log directory is
//! configured and exists.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "print-bridge";

/// Initialize the logger with defaults
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins over `log_level` when set. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, LOG_FILE_PREFIX);
            let builder = builder.with_ansi(false).with_writer(file_appender);
            let _ = if json.unwrap_or(false) {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            return;
        }
        eprintln!("log directory {} does not exist, logging to stdout", dir);
    }

    let _ = if json.unwrap_or(false) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
