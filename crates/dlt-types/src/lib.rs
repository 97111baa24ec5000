//! # DLT Types Crate
//!
//! Types shared by every crate in the daemon workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: connection kinds, client masks and control
//!   service identifiers are defined once, here.
//! - **No I/O**: this crate never touches a file descriptor.

pub mod connection;
pub mod errors;
pub mod level;
pub mod service;

pub use connection::{ClientMask, ConnectionId, ConnectionStatus, ConnectionType};
pub use errors::TypesError;
pub use level::{FilterLevel, LEVEL_MAX};
pub use service::{ServiceId, ServiceResponse};
