//! # Domain Layer
//!
//! Connections, receivers and the readiness table.

pub mod connection;
pub mod receiver;
pub mod table;

pub use connection::{Connection, ConnectionIdAllocator};
pub use receiver::{Endpoint, ReadStatus, Receiver};
pub use table::{PollEntry, ReadinessTable, BASE_FD};
