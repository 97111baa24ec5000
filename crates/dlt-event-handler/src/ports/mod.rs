//! # Ports Layer
//!
//! - [`Poller`] - the OS readiness wait (production: `NixPoller`)
//! - [`ConnectionPolicy`] - which connection types may be active
//! - [`ConnectionHandler`] - per-type processing of ready connections

use std::time::Duration;

use dlt_types::{ClientMask, ConnectionId, ConnectionType};

use crate::domain::{PollEntry, Receiver};
use crate::error::{EventHandlerError, HandlerError};
use crate::service::EventHandler;

/// Readiness wait over the occupied table entries.
pub trait Poller {
    /// Block up to `timeout`, then store results in each entry's `revents`.
    ///
    /// An interrupted wait returns `Ok(0)` with every result cleared.
    fn poll(&mut self, entries: &mut [PollEntry], timeout: Duration)
        -> Result<usize, EventHandlerError>;
}

/// Policy consulted when a connection is (re)activated.
pub trait ConnectionPolicy {
    fn connection_allowed(&self, ty: ConnectionType) -> bool;
}

impl ConnectionPolicy for ClientMask {
    fn connection_allowed(&self, ty: ConnectionType) -> bool {
        self.contains(ty)
    }
}

impl ConnectionPolicy for dlt_filter::MessageFilter {
    fn connection_allowed(&self, ty: ConnectionType) -> bool {
        dlt_filter::MessageFilter::connection_allowed(self, ty)
    }
}

/// Processing for one connection type.
///
/// `receiver` is moved out of the connection for the duration of the call,
/// so the handler may freely register or unregister connections, including
/// its own.
pub trait ConnectionHandler<S> {
    fn process(
        &self,
        state: &mut S,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError>;
}

impl<S, F> ConnectionHandler<S> for F
where
    F: Fn(&mut S, &mut EventHandler, ConnectionId, &mut Receiver) -> Result<(), HandlerError>,
{
    fn process(
        &self,
        state: &mut S,
        events: &mut EventHandler,
        connection: ConnectionId,
        receiver: &mut Receiver,
    ) -> Result<(), HandlerError> {
        self(state, events, connection, receiver)
    }
}
