// Error types for the alert engine and its replay tooling.
//
// Nothing here ever reaches the matching loop: senders return
// `DeliveryError`, the dispatcher logs it and moves on to the next action.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single notification sender.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The sender is not configured or its backend is gone
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    /// Reading a sound file or writing to a notification backend failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Audio device or decoder failure
    #[error("sound playback failed for {path:?}: {message}")]
    Sound { path: PathBuf, message: String },

    /// The backend refused the notification
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Settings file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recorded event files that cannot be replayed.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("cannot open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot read distance table {path:?}: {message}")]
    Distances { path: PathBuf, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_messages() {
        let err = DeliveryError::Unavailable("push notifications");
        assert_eq!(err.to_string(), "push notifications is unavailable");

        let err = DeliveryError::Sound {
            path: PathBuf::from("alarm.wav"),
            message: "no device".to_string(),
        };
        assert!(err.to_string().contains("alarm.wav"));
        assert!(err.to_string().contains("no device"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: DeliveryError = io_err.into();
        assert!(matches!(err, DeliveryError::Io(_)));
    }
}
