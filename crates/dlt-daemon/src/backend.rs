//! # Filter Backend Link
//!
//! An external authority may move the filter level. It talks to the event
//! loop through a [`BackendNotifier`]: each event is queued on a channel and
//! one byte is written to a socket pair whose read end is registered as the
//! `FilterBackend` connection. The loop drains the queue when that end
//! becomes readable.

use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use dlt_types::FilterLevel;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::DaemonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    /// Backend came up and reports its current level.
    Connected { level: FilterLevel },
    /// Backend went away; the filter returns to its default level.
    Disconnected,
    LevelChanged(FilterLevel),
}

/// Sending half, usable from any thread.
#[derive(Debug, Clone)]
pub struct BackendNotifier {
    tx: UnboundedSender<BackendEvent>,
    wake: Arc<UnixStream>,
}

impl BackendNotifier {
    pub fn notify(&self, event: BackendEvent) -> Result<(), DaemonError> {
        self.tx
            .send(event)
            .map_err(|_| DaemonError::Io("backend event loop is gone".into()))?;
        match (&*self.wake).write(&[1]) {
            Ok(_) => Ok(()),
            // Wake byte already pending, the loop will see this event too.
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Receiving half, owned by the event loop.
#[derive(Debug)]
pub struct BackendEvents {
    rx: UnboundedReceiver<BackendEvent>,
}

impl BackendEvents {
    /// Every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if !events.is_empty() {
            debug!(count = events.len(), "Drained backend events");
        }
        events
    }
}

/// Create a linked notifier and event queue plus the wake socket to poll.
pub fn backend_link() -> Result<(BackendNotifier, BackendEvents, UnixStream), DaemonError> {
    let (wake_tx, wake_rx) = UnixStream::pair()?;
    wake_tx.set_nonblocking(true)?;
    wake_rx.set_nonblocking(true)?;
    let (tx, rx) = mpsc::unbounded_channel();
    Ok((
        BackendNotifier {
            tx,
            wake: Arc::new(wake_tx),
        },
        BackendEvents { rx },
        wake_rx,
    ))
}
