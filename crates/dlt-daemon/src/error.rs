//! Error types for the daemon runtime.

use dlt_event_handler::EventHandlerError;
use dlt_filter::FilterError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    EventHandler(#[from] EventHandlerError),

    /// A listening socket could not be opened. The daemon cannot run without it.
    #[error("Failed to open socket {addr}: {error}")]
    Socket { addr: String, error: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Malformed control frame: {0}")]
    Codec(String),
}

impl From<std::io::Error> for DaemonError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl DaemonError {
    /// Whether this error must bring the whole daemon down.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Socket { .. })
    }
}
