//! Structured JSONL logging plus human-readable stderr output.
//!
//! Dual-output logging for the overlay subsystem:
//! - **JSONL to file** (`~/.autofill-overlay/logs/autofill-overlay.jsonl`),
//!   structured for log tooling
//! - **Pretty to stderr** for developers
//!
//! Filtering is controlled through `RUST_LOG` (an [`EnvFilter`]); the default
//! level is `info`. Initialization is optional: the crate logs through the
//! `tracing` macros and works fine under any subscriber the embedding
//! application installs instead.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system with the default log directory.
pub fn init() -> LoggingGuard {
    init_in(&default_log_dir())
}

/// Initialize logging with an explicit log directory.
///
/// When the directory or log file cannot be created, the file layer is
/// skipped and only stderr output remains. When a global subscriber is
/// already set (common in tests), this quietly leaves it in place.
pub fn init_in(log_dir: &Path) -> LoggingGuard {
    let file = fs::create_dir_all(log_dir)
        .ok()
        .and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_dir.join("autofill-overlay.jsonl"))
                .ok()
        });

    let (file_layer, guard) = match file {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => {
            eprintln!(
                "[autofill-overlay] could not open log file in {}, logging to stderr only",
                log_dir.display()
            );
            (None, None)
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    LoggingGuard { _file_guard: guard }
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".autofill-overlay")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_in_creates_log_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log_dir = dir.path().join("logs");

        let _guard = init_in(&log_dir);
        tracing::info!("overlay logging smoke test");

        assert!(log_dir.join("autofill-overlay.jsonl").exists());
    }

    #[test]
    fn test_init_in_tolerates_unwritable_dir() {
        // A path under a regular file cannot be created as a directory.
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let bogus = file.path().join("logs");

        let _guard = init_in(&bogus);
    }
}
