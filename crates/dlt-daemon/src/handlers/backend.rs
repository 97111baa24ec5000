use dlt_event_handler::{ConnectionHandler, EventHandler, HandlerError, ReadStatus, Receiver};
use dlt_types::ConnectionId;
use tracing::{info, warn};

use crate::backend::{BackendEvent, BackendEvents};
use crate::level::apply_filter_level;
use crate::state::DaemonState;

/// Applies the level changes queued by the filter backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendHandler;

impl ConnectionHandler<DaemonState> for BackendHandler {
    fn process(
        &self,
        state: &mut DaemonState,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        loop {
            match receiver.fill()? {
                ReadStatus::Data(_) => {
                    let n = receiver.buffer().len();
                    receiver.consume(n);
                }
                ReadStatus::WouldBlock => break,
                ReadStatus::Closed => {
                    info!("Filter backend link closed");
                    events.unregister_connection(connection)?;
                    break;
                }
            }
        }

        let pending = state
            .backend
            .as_mut()
            .map(BackendEvents::drain)
            .unwrap_or_default();
        for event in pending {
            let level = match event {
                BackendEvent::Connected { level } | BackendEvent::LevelChanged(level) => level,
                BackendEvent::Disconnected => state.filter.default_level(),
            };
            match apply_filter_level(state, events, level) {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => warn!(?event, error = %e, "Backend level rejected"),
            }
        }
        Ok(())
    }
}
