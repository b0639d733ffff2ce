//! Error types and logging helpers.
//!
//! Nothing in this subsystem is fatal to the host page: every failure mode
//! degrades to "overlay does not appear" or "overlay closes". Errors exist to
//! be logged, not propagated to the user.

use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while driving the overlay.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("overlay host node creation failed: {0}")]
    NodeCreation(String),

    #[error("failed to decode protocol payload: {0}")]
    ProtocolParse(#[from] serde_json::Error),
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
pub trait ResultExt<T> {
    /// Log the error and return `None`. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as a warning and return `None`. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
