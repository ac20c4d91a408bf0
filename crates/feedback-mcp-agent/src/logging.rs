//! Log setup. Stdout carries the MCP transport, so console output goes to stderr.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "interactive-feedback-mcp.log";

/// Build the filter: `RUST_LOG` wins, otherwise `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Daily-rotated appender in `dir`, creating the directory when needed
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
}

/// Install the global subscriber.
///
/// With `log_dir`, a daily-rotated file layer is added; the returned guard
/// must live until shutdown or buffered lines are lost. A directory that
/// cannot be used is reported and logging continues on stderr only.
pub fn init_logging(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let mut file_error = None;
    let (file_layer, guard) = match log_dir.map(file_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if let Some(dir) = log_dir {
        match file_error {
            None => tracing::info!("Writing log files to {}", dir.display()),
            Some(e) => tracing::warn!(
                "Cannot write log files to {}, logging to stderr only: {}",
                dir.display(),
                e
            ),
        }
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        // Must not panic on garbage directives
        let filter = env_filter("not a [valid] filter ===");
        let _ = filter.to_string();
    }

    #[test]
    fn test_file_appender_in_writable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        assert!(file_appender(&logs).is_ok());
        assert!(logs.is_dir());
    }

    #[test]
    fn test_unusable_log_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        std::fs::write(&not_a_dir, b"x").unwrap();
        assert!(file_appender(&not_a_dir).is_err());
        assert!(file_appender(&not_a_dir.join("nested")).is_err());
    }
}
