//! # Event Handler Service
//!
//! Owns every [`Connection`] and the [`ReadinessTable`]. One call to
//! [`EventHandler::handle_events`] waits once and dispatches every ready
//! connection to the handler for its type.
//!
//! ## Activation
//!
//! [`EventHandler::check_activate`] is the only path between policy and the
//! readiness table. It runs on registration, unregistration and whenever
//! the caller reconciles after a level change.
//!
//! | Status | Allowed and activate | Otherwise |
//! |--------|----------------------|-----------|
//! | Inactive | enable fd, become Active | unchanged |
//! | Active | unchanged | disable fd, become Inactive |
//! | other | error | error |

mod dispatch;

use std::os::fd::RawFd;
use std::time::Duration;

use dlt_types::{ClientMask, ConnectionId, ConnectionStatus, ConnectionType};
use nix::poll::PollFlags;
use tracing::{debug, error, trace, warn};

use crate::domain::{Connection, ConnectionIdAllocator, Endpoint, ReadinessTable, Receiver};
use crate::error::EventHandlerError;
use crate::ports::{ConnectionPolicy, Poller};

pub use dispatch::{DispatchTable, DispatchTableBuilder};

/// Requested direction of [`EventHandler::check_activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate,
    Deactivate,
}

#[derive(Debug, Default)]
pub struct EventHandler {
    table: ReadinessTable,
    connections: Vec<Connection>,
    ids: ConnectionIdAllocator,
    counts: [usize; ConnectionType::COUNT],
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &ReadinessTable {
        &self.table
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    fn index_of(&self, id: ConnectionId) -> Result<usize, EventHandlerError> {
        self.connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(EventHandlerError::ConnectionNotFound(id))
    }

    /// Take ownership of `receiver` as a new connection and activate it if
    /// `policy` allows its type.
    pub fn register_connection<P: ConnectionPolicy + ?Sized>(
        &mut self,
        policy: &P,
        ty: ConnectionType,
        receiver: Receiver,
        ev_mask: PollFlags,
    ) -> Result<ConnectionId, EventHandlerError> {
        if receiver.is_released() {
            return Err(EventHandlerError::InvalidParameter(format!(
                "cannot register {ty} connection without an endpoint"
            )));
        }

        let id = self.ids.next_id();
        let connection = Connection::new(id, ty, receiver, ev_mask);
        debug!(connection_id = %id, kind = %ty, fd = ?connection.fd, "Registering connection");
        self.connections.push(connection);
        self.counts[ty.index()] += 1;

        if let Err(e) = self.check_activate(id, policy, Transition::Activate) {
            self.connections.pop();
            self.counts[ty.index()] -= 1;
            return Err(e);
        }
        Ok(id)
    }

    /// Deactivate, remove and drop a connection, closing its descriptor.
    pub fn unregister_connection(&mut self, id: ConnectionId) -> Result<(), EventHandlerError> {
        self.check_activate(id, &ClientMask::EMPTY, Transition::Deactivate)?;
        let idx = self.index_of(id)?;
        let connection = self.connections.remove(idx);
        self.counts[connection.ty.index()] = self.counts[connection.ty.index()].saturating_sub(1);
        debug!(connection_id = %id, kind = %connection.ty, "Unregistered connection");
        Ok(())
    }

    /// Reconcile one connection's table registration with `policy`.
    pub fn check_activate<P: ConnectionPolicy + ?Sized>(
        &mut self,
        id: ConnectionId,
        policy: &P,
        transition: Transition,
    ) -> Result<(), EventHandlerError> {
        let idx = self.index_of(id)?;
        let conn = &mut self.connections[idx];
        let allowed = policy.connection_allowed(conn.ty);

        match conn.status {
            ConnectionStatus::Active => {
                if !allowed || transition == Transition::Deactivate {
                    if let Some(fd) = conn.fd {
                        self.table.disable(fd);
                    }
                    if conn.ty == ConnectionType::ClientConnect {
                        if let Some(receiver) = conn.receiver.as_mut() {
                            receiver.release();
                        }
                        conn.fd = None;
                    }
                    conn.status = ConnectionStatus::Inactive;
                    debug!(connection_id = %id, kind = %conn.ty, "Deactivated connection");
                }
                Ok(())
            }
            ConnectionStatus::Inactive => {
                if allowed && transition == Transition::Activate {
                    let Some(fd) = conn.fd else {
                        trace!(connection_id = %id, kind = %conn.ty, "No descriptor to activate");
                        return Ok(());
                    };
                    self.table.enable(fd, conn.ev_mask)?;
                    conn.status = ConnectionStatus::Active;
                    debug!(connection_id = %id, kind = %conn.ty, fd, "Activated connection");
                }
                Ok(())
            }
            status => {
                error!(connection_id = %id, ?status, "Connection in unexpected state");
                Err(EventHandlerError::InvalidStatus { id, status })
            }
        }
    }

    /// Run [`check_activate`](Self::check_activate) with `Activate` on every
    /// connection whose type is in `types`.
    pub fn reconcile_types<P: ConnectionPolicy + ?Sized>(
        &mut self,
        policy: &P,
        types: ClientMask,
    ) -> Result<(), EventHandlerError> {
        for id in self.connection_ids_of(types) {
            self.check_activate(id, policy, Transition::Activate)?;
        }
        Ok(())
    }

    /// Give an inactive connection a new endpoint.
    pub fn assign_receiver(
        &mut self,
        id: ConnectionId,
        endpoint: Endpoint,
    ) -> Result<(), EventHandlerError> {
        let idx = self.index_of(id)?;
        let conn = &mut self.connections[idx];
        if conn.is_active() {
            return Err(EventHandlerError::InvalidParameter(format!(
                "connection {id} is active"
            )));
        }
        let receiver = conn.receiver.as_mut().ok_or_else(|| {
            EventHandlerError::InvalidParameter(format!("connection {id} is being dispatched"))
        })?;
        receiver.assign(endpoint);
        conn.refresh_fd();
        Ok(())
    }

    pub fn find_by_fd(&self, fd: RawFd) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| c.fd == Some(fd))
            .map(|c| c.id)
    }

    /// First connection of `ty`.
    pub fn find_by_type(&self, ty: ConnectionType) -> Option<ConnectionId> {
        self.connections.iter().find(|c| c.ty == ty).map(|c| c.id)
    }

    /// Ids of every connection whose type is in `types`, in registration order.
    pub fn connection_ids_of(&self, types: ClientMask) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|c| types.contains(c.ty))
            .map(|c| c.id)
            .collect()
    }

    pub fn connection_count(&self, ty: ConnectionType) -> usize {
        self.counts[ty.index()]
    }

    /// Write `bytes` to every active connection of `types`.
    ///
    /// A connection that fails the write is torn down. Returns the number of
    /// successful deliveries.
    ///
    /// Writes are not buffered. A non-blocking peer that cannot take the
    /// whole record fails with `WouldBlock` after a partial write and is
    /// dropped like any other failed peer, so it may see a truncated record
    /// before the close.
    pub fn send_to_types(&mut self, types: ClientMask, bytes: &[u8]) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for conn in self
            .connections
            .iter_mut()
            .filter(|c| c.is_active() && types.contains(c.ty))
        {
            let Some(receiver) = conn.receiver.as_mut() else {
                continue;
            };
            match receiver.send(bytes) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(connection_id = %conn.id, kind = %conn.ty, error = %e, "Send failed");
                    failed.push(conn.id);
                }
            }
        }
        for id in failed {
            if let Err(e) = self.unregister_connection(id) {
                warn!(connection_id = %id, error = %e, "Failed to drop connection");
            }
        }
        delivered
    }

    /// Unregister every connection.
    pub fn cleanup(&mut self) {
        let ids: Vec<_> = self.connections.iter().map(|c| c.id).collect();
        for id in ids {
            if let Err(e) = self.unregister_connection(id) {
                warn!(connection_id = %id, error = %e, "Failed to drop connection");
            }
        }
        debug!(remaining = self.table.nfds(), "Event handler cleaned up");
    }

    fn restore_receiver(&mut self, id: ConnectionId, receiver: Receiver) {
        let Ok(idx) = self.index_of(id) else {
            return;
        };
        let conn = &mut self.connections[idx];
        let previous = conn.fd;
        conn.receiver = Some(receiver);
        conn.refresh_fd();

        if conn.is_active() && previous != conn.fd {
            if let Some(fd) = previous {
                self.table.disable(fd);
            }
            let enabled = match conn.fd {
                Some(fd) => self.table.enable(fd, conn.ev_mask).is_ok(),
                None => false,
            };
            if !enabled {
                conn.status = ConnectionStatus::Inactive;
            }
        }
    }

    /// Wait once and dispatch every ready connection.
    ///
    /// Returns the number of handler invocations. A handler failure aborts
    /// the iteration with [`EventHandlerError::Handler`].
    pub fn handle_events<S, P: Poller + ?Sized>(
        &mut self,
        state: &mut S,
        dispatch: &DispatchTable<S>,
        poller: &mut P,
        timeout: Duration,
    ) -> Result<usize, EventHandlerError> {
        if poller.poll(self.table.occupied_mut(), timeout)? == 0 {
            return Ok(0);
        }
        // Results belong to the connection that owned the fd during the wait.
        // A handler may close it and a later accept may reuse the number.
        let ready: Vec<_> = self
            .table
            .ready()
            .into_iter()
            .map(|(fd, revents)| (fd, revents, self.find_by_fd(fd)))
            .collect();
        self.table.clear_revents();

        let mut dispatched = 0;
        for (fd, revents, owner) in ready {
            let Some(owner) = owner else {
                if self.find_by_fd(fd).is_none() && self.table.disable(fd) {
                    warn!(fd, "Dropped readiness entry without connection");
                }
                continue;
            };
            let Ok(idx) = self.index_of(owner) else {
                trace!(connection_id = %owner, fd, "Connection closed earlier in this round");
                continue;
            };
            let conn = &mut self.connections[idx];
            if !conn.is_active() || conn.fd != Some(fd) {
                continue;
            }
            let (id, ty) = (conn.id, conn.ty);

            if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
                debug!(connection_id = %id, kind = %ty, fd, ?revents, "Tearing down failed connection");
                self.unregister_connection(id)?;
                continue;
            }

            let Some(mut receiver) = self.connections[idx].receiver.take() else {
                continue;
            };
            trace!(connection_id = %id, kind = %ty, fd, "Dispatching");
            let result = dispatch.handler(ty).process(state, self, id, &mut receiver);
            self.restore_receiver(id, receiver);
            dispatched += 1;

            if let Err(e) = result {
                error!(connection_id = %id, kind = %ty, error = %e, "Connection handler failed");
                return Err(EventHandlerError::Handler {
                    kind: ty,
                    message: e.0,
                });
            }
        }
        Ok(dispatched)
    }
}
