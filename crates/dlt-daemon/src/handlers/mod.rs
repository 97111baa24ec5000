//! # Connection Handlers
//!
//! One [`ConnectionHandler`](dlt_event_handler::ConnectionHandler) per
//! connection type, assembled into the daemon's dispatch table.
//!
//! | Type | Handler |
//! |------|---------|
//! | `ClientConnect`, `AppConnect`, `ControlConnect` | [`AcceptHandler`] |
//! | `ClientMsgTcp`, `ClientMsgSerial`, `ControlMsg` | [`ControlStreamHandler`] |
//! | `AppMsg` | [`AppMessageHandler`] |
//! | timers | [`TimerHandler`] |
//! | `FilterBackend` | [`BackendHandler`] |
//! | offline storage and gateway | [`DiscardHandler`] |

mod accept;
mod backend;
mod control;
mod stream;
mod timer;


use dlt_event_handler::{DispatchTable, EventHandlerError, HandlerError};
use dlt_types::ConnectionType;

use crate::error::DaemonError;
use crate::state::DaemonState;

pub use accept::AcceptHandler;
pub use backend::BackendHandler;
pub use control::serve_request;
pub use stream::{AppMessageHandler, ControlStreamHandler, DiscardHandler};
pub use timer::TimerHandler;

impl From<DaemonError> for HandlerError {
    fn from(e: DaemonError) -> Self {
        HandlerError(e.to_string())
    }
}

/// The daemon's complete dispatch table.
pub fn dispatch_table() -> Result<DispatchTable<DaemonState>, EventHandlerError> {
    use ConnectionType::*;

    DispatchTable::builder()
        .register(ClientConnect, AcceptHandler::new(ClientMsgTcp))
        .register(AppConnect, AcceptHandler::new(AppMsg))
        .register(ControlConnect, AcceptHandler::new(ControlMsg).fatal())
        .register(ClientMsgTcp, ControlStreamHandler)
        .register(ClientMsgSerial, ControlStreamHandler)
        .register(ControlMsg, ControlStreamHandler)
        .register(AppMsg, AppMessageHandler)
        .register(OneSecondTimer, TimerHandler::new(OneSecondTimer))
        .register(SixtySecondTimer, TimerHandler::new(SixtySecondTimer))
        .register(WatchdogTimer, TimerHandler::new(WatchdogTimer))
        .register(GatewayTimer, TimerHandler::new(GatewayTimer))
        .register(FilterBackend, BackendHandler)
        .register(OfflineTrace, DiscardHandler)
        .register(OfflineLogstorage, DiscardHandler)
        .register(Gateway, DiscardHandler)
        .build()
}
