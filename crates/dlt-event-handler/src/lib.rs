//! # DLT Event Handler
//!
//! Single-threaded connection multiplexer. Every monitored endpoint is a
//! [`Connection`] owned by the [`EventHandler`]; active connections have
//! exactly one entry in the [`ReadinessTable`] passed to `poll(2)`.
//!
//! ## Dispatch
//!
//! ```text
//! poll(table) ──> snapshot ready fds ──> fd -> Connection
//!                                          │
//!                    POLLERR/POLLNVAL ─────┼──> unregister
//!                                          │
//!                    readable ─────────────┴──> DispatchTable[type].process()
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Table mirrors activity | Active connections and occupied table entries correspond 1:1 |
//! | Compact table | Occupied entries are the first `nfds` slots |
//! | Non-zero ids | Connection id zero is never issued |
//! | Complete dispatch | Every connection type has a handler |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Connection, Receiver, readiness table
//! - `ports/` - Poller, ConnectionPolicy, ConnectionHandler
//! - `service/` - EventHandler and the dispatch table
//! - `adapters/` - nix poller, scripted poller (`test-utils`)

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::NixPoller;
#[cfg(any(test, feature = "test-utils"))]
pub use adapters::ScriptedPoller;
pub use domain::{
    Connection, ConnectionIdAllocator, Endpoint, PollEntry, ReadStatus, ReadinessTable, Receiver,
    BASE_FD,
};
pub use error::{EventHandlerError, HandlerError};
pub use nix::poll::PollFlags;
pub use ports::{ConnectionHandler, ConnectionPolicy, Poller};
pub use service::{DispatchTable, DispatchTableBuilder, EventHandler, Transition};
