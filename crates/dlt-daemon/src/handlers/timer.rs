use dlt_event_handler::{ConnectionHandler, Endpoint, EventHandler, HandlerError, Receiver};
use dlt_types::{ConnectionId, ConnectionType};
use nix::errno::Errno;
use tracing::{debug, info, trace};

use crate::state::DaemonState;

/// Acknowledges a periodic timer and runs its housekeeping.
#[derive(Debug, Clone, Copy)]
pub struct TimerHandler {
    kind: ConnectionType,
}

impl TimerHandler {
    pub fn new(kind: ConnectionType) -> Self {
        Self { kind }
    }
}

impl ConnectionHandler<DaemonState> for TimerHandler {
    fn process(
        &self,
        state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        let Some(Endpoint::Timer(timer)) = receiver.endpoint() else {
            return Err(HandlerError::new(format!(
                "{} connection {connection} has no timer",
                self.kind
            )));
        };
        match timer.wait() {
            Ok(()) | Err(Errno::EAGAIN) => {}
            Err(e) => return Err(HandlerError::new(format!("timer read failed: {e}"))),
        }

        match self.kind {
            ConnectionType::SixtySecondTimer => {
                let stats = &state.stats;
                info!(
                    level = state.filter.level(),
                    segment = %state.filter.current_segment().name,
                    clients = events.connection_count(ConnectionType::ClientMsgTcp),
                    apps = events.connection_count(ConnectionType::AppMsg),
                    app_bytes = stats.app_bytes,
                    forwarded = stats.forwarded,
                    control_requests = stats.control_requests,
                    denied = stats.denied_requests,
                    "Daemon statistics"
                );
            }
            ConnectionType::WatchdogTimer => debug!("Watchdog keepalive"),
            kind => trace!(%kind, "Timer tick"),
        }
        Ok(())
    }
}
