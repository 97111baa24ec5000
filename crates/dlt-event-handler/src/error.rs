//! Error types for the connection multiplexer.

use dlt_types::{ConnectionId, ConnectionStatus, ConnectionType};
use thiserror::Error;

/// Errors raised by the event handler and its readiness table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventHandlerError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// A connection reached activation in a state it can never be in there.
    #[error("Connection {id} has unexpected status {status:?}")]
    InvalidStatus {
        id: ConnectionId,
        status: ConnectionStatus,
    },

    #[error("No handler registered for connection type {0}")]
    MissingHandler(ConnectionType),

    #[error("Readiness wait failed: {0}")]
    Poll(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Out of resources: {0}")]
    ResourceExhausted(String),

    /// A connection handler failed; the dispatch loop cannot continue.
    #[error("Handler for {kind} failed: {message}")]
    Handler {
        kind: ConnectionType,
        message: String,
    },
}

/// Failure reported by a connection handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<EventHandlerError> for HandlerError {
    fn from(e: EventHandlerError) -> Self {
        Self(e.to_string())
    }
}

impl From<dlt_filter::FilterError> for HandlerError {
    fn from(e: dlt_filter::FilterError) -> Self {
        Self(e.to_string())
    }
}
