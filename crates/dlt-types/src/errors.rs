//! Error types for the shared vocabulary.

use thiserror::Error;

/// Errors raised while converting raw values into shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// A numeric connection type index has no matching variant.
    #[error("unknown connection type index: {0}")]
    UnknownConnectionType(usize),

    /// A response status byte has no matching variant.
    #[error("unknown service response status: {0}")]
    UnknownResponse(u8),
}
