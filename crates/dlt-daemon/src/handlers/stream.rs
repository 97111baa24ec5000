use dlt_event_handler::{ConnectionHandler, EventHandler, HandlerError, ReadStatus, Receiver};
use dlt_types::{ClientMask, ConnectionId, ConnectionType};
use tracing::{debug, trace, warn};

use crate::control::ControlRequest;
use crate::state::DaemonState;

use super::control::serve_request;

/// Outcome of reading a peer.
enum Fill {
    Data,
    Nothing,
    /// The peer is gone and was unregistered.
    Dropped,
}

fn fill_or_drop(
    events: &mut EventHandler,
    connection: ConnectionId,
    receiver: &mut Receiver,
) -> Result<Fill, HandlerError> {
    match receiver.fill() {
        Ok(ReadStatus::Data(n)) => {
            trace!(connection_id = %connection, bytes = n, "Read");
            Ok(Fill::Data)
        }
        Ok(ReadStatus::WouldBlock) => Ok(Fill::Nothing),
        Ok(ReadStatus::Closed) => {
            debug!(connection_id = %connection, "Peer closed connection");
            drop_peer(events, connection)
        }
        Err(e) => {
            warn!(connection_id = %connection, error = %e, "Read failed");
            drop_peer(events, connection)
        }
    }
}

fn drop_peer(events: &mut EventHandler, connection: ConnectionId) -> Result<Fill, HandlerError> {
    events.unregister_connection(connection)?;
    Ok(Fill::Dropped)
}

/// Serves control requests and answers on the same connection.
#[derive(Debug, Clone, Copy)]
pub struct ControlStreamHandler;

impl ConnectionHandler<DaemonState> for ControlStreamHandler {
    fn process(
        &self,
        state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        if !matches!(fill_or_drop(events, connection, receiver)?, Fill::Data) {
            return Ok(());
        }

        loop {
            let (request, used) = match ControlRequest::decode(receiver.buffer()) {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(connection_id = %connection, error = %e, "Dropping control peer");
                    drop_peer(events, connection)?;
                    return Ok(());
                }
            };
            receiver.consume(used);

            let response = serve_request(state, events, &request);
            if let Err(e) = receiver.send(&response.encode()) {
                warn!(connection_id = %connection, error = %e, "Reply failed");
                drop_peer(events, connection)?;
                return Ok(());
            }
        }
    }
}

/// Forwards application output to every active log consumer.
#[derive(Debug, Clone, Copy)]
pub struct AppMessageHandler;

impl AppMessageHandler {
    const CONSUMERS: ClientMask = ClientMask::from_bits(
        ConnectionType::ClientMsgTcp.bit() | ConnectionType::ClientMsgSerial.bit(),
    );
}

impl ConnectionHandler<DaemonState> for AppMessageHandler {
    fn process(
        &self,
        state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        if !matches!(fill_or_drop(events, connection, receiver)?, Fill::Data) {
            return Ok(());
        }
        let pending = receiver.buffer().to_vec();
        receiver.consume(pending.len());

        let delivered = events.send_to_types(Self::CONSUMERS, &pending);
        state.stats.app_bytes += pending.len() as u64;
        state.stats.forwarded += delivered as u64;
        trace!(connection_id = %connection, bytes = pending.len(), delivered, "Forwarded");
        Ok(())
    }
}

/// Reads and drops input on endpoints owned by external collaborators.
#[derive(Debug, Clone, Copy)]
pub struct DiscardHandler;

impl ConnectionHandler<DaemonState> for DiscardHandler {
    fn process(
        &self,
        _state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        if let Fill::Data = fill_or_drop(events, connection, receiver)? {
            let n = receiver.buffer().len();
            receiver.consume(n);
        }
        Ok(())
    }
}
