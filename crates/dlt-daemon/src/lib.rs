//! # DLT Daemon
//!
//! Wires the message filter and the event handler into a running daemon:
//! endpoints, per-type connection handlers, the control service and the
//! filter backend link.
//!
//! ## Modules
//!
//! - `config` - `[daemon]` TOML configuration
//! - `daemon` - lifecycle and event loop
//! - `handlers` - one handler per connection type
//! - `level` - applying a filter level to live connections
//! - `control` - control request and response framing
//! - `backend` - channel from the external filter backend

pub mod backend;
pub mod config;
pub mod control;
pub mod daemon;
pub mod endpoints;
pub mod error;
pub mod exit;
pub mod handlers;
pub mod level;
pub mod logging;
pub mod state;

pub use backend::{backend_link, BackendEvent, BackendEvents, BackendNotifier};
pub use config::DaemonConfig;
pub use control::{ControlRequest, ControlResponse, InjectionTarget};
pub use daemon::Daemon;
pub use error::DaemonError;
pub use exit::ExitFlag;
pub use level::apply_filter_level;
pub use logging::init_logging;
pub use state::{DaemonState, DaemonStats};
