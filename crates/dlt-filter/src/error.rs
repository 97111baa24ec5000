//! Error types for the message filter engine.

use dlt_types::{FilterLevel, ServiceId};
use thiserror::Error;

/// Errors that can occur while building or querying the message filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Service id {id:#x} is outside both control banks")]
    ServiceIdOutOfRange { id: ServiceId },

    #[error("Filter level {level} exceeds maximum {max}")]
    LevelOutOfRange { level: i64, max: FilterLevel },

    #[error("Two filter segments claim level {level}")]
    DuplicateLevel { level: FilterLevel },

    #[error("Filter '{filter}' references unknown injection '{injection}'")]
    UnknownInjection { filter: String, injection: String },

    #[error("Invalid filter configuration: {0}")]
    ConfigInvalid(String),

    #[error("Failed to parse filter configuration: {0}")]
    ConfigParse(String),

    #[error("Failed to read filter configuration {path}: {error}")]
    ConfigIo { path: String, error: String },

    #[error("No filter segment covers level {level}")]
    NoSegmentForLevel { level: FilterLevel },

    #[error("Internal filter inconsistency: {0}")]
    Internal(String),
}
