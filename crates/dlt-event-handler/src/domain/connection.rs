//! Monitored connections and their identifiers.

use std::os::fd::RawFd;

use dlt_types::{ConnectionId, ConnectionStatus, ConnectionType};
use nix::poll::PollFlags;

use super::receiver::Receiver;

/// One monitored endpoint.
///
/// `receiver` is `None` only while the connection's handler runs.
#[derive(Debug)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) ty: ConnectionType,
    pub(crate) status: ConnectionStatus,
    pub(crate) ev_mask: PollFlags,
    pub(crate) receiver: Option<Receiver>,
    /// Descriptor of the receiver as last seen by the event handler.
    pub(crate) fd: Option<RawFd>,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        ty: ConnectionType,
        receiver: Receiver,
        ev_mask: PollFlags,
    ) -> Self {
        let fd = receiver.raw_fd();
        Self {
            id,
            ty,
            status: ConnectionStatus::Inactive,
            ev_mask,
            receiver: Some(receiver),
            fd,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.ty
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn ev_mask(&self) -> PollFlags {
        self.ev_mask
    }

    pub fn fd(&self) -> Option<RawFd> {
        self.fd
    }

    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }

    /// Owned receiver, absent while the handler for this connection runs.
    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }

    pub(crate) fn refresh_fd(&mut self) {
        if let Some(receiver) = &self.receiver {
            self.fd = receiver.raw_fd();
        }
    }
}

/// Issues non-zero connection ids, skipping zero on wrap-around.
#[derive(Debug, Clone)]
pub struct ConnectionIdAllocator {
    next: u32,
}

impl Default for ConnectionIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl ConnectionIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start issuing from `raw` (zero is bumped to one).
    pub fn starting_at(raw: u32) -> Self {
        Self { next: raw.max(1) }
    }

    pub fn next_id(&mut self) -> ConnectionId {
        loop {
            let raw = self.next;
            self.next = self.next.wrapping_add(1);
            if let Some(id) = ConnectionId::new(raw) {
                return id;
            }
        }
    }
}
