use std::io;

use dlt_event_handler::{
    ConnectionHandler, EventHandler, HandlerError, PollFlags, Receiver,
};
use dlt_types::{ConnectionId, ConnectionType};
use tracing::{debug, error, warn};

use crate::state::DaemonState;

/// Accepts every pending peer on a listener and registers it as `peer`.
#[derive(Debug, Clone, Copy)]
pub struct AcceptHandler {
    peer: ConnectionType,
    fatal: bool,
}

impl AcceptHandler {
    pub fn new(peer: ConnectionType) -> Self {
        Self { peer, fatal: false }
    }

    /// Treat a failing listener as fatal to the daemon.
    #[must_use]
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

impl ConnectionHandler<DaemonState> for AcceptHandler {
    fn process(
        &self,
        state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        let listener = receiver
            .endpoint()
            .ok_or_else(|| HandlerError::new(format!("listener {connection} has no socket")))?;

        loop {
            let endpoint = match listener.accept() {
                Ok(endpoint) => endpoint,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
                    ) =>
                {
                    continue
                }
                Err(e) if self.fatal => {
                    error!(connection_id = %connection, error = %e, "Listener failed");
                    state.exit.request();
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(connection_id = %connection, error = %e, "Accept failed");
                    return Ok(());
                }
            };

            match events.register_connection(
                &state.filter,
                self.peer,
                Receiver::new(endpoint),
                PollFlags::POLLIN,
            ) {
                Ok(id) => {
                    state.stats.accepted[self.peer.index()] += 1;
                    debug!(listener = %connection, connection_id = %id, kind = %self.peer, "Accepted peer");
                }
                Err(e) => warn!(kind = %self.peer, error = %e, "Dropping accepted peer"),
            }
        }
    }
}
