//! # Filter Level Application
//!
//! Moving the filter level changes which connection types may be active.
//! After the filter selects its new segment every connection is reconciled
//! against it. The client listener needs extra care: deactivation closes
//! its socket, so allowing TCP again opens a fresh one.
//!
//! Applying the same level twice leaves every connection and table entry
//! untouched.

use std::net::SocketAddr;

use dlt_event_handler::{Endpoint, EventHandler, PollFlags, Receiver};
use dlt_filter::LevelChange;
use dlt_types::{ClientMask, ConnectionType, FilterLevel};
use tracing::{debug, error};

use crate::endpoints::open_tcp_listener;
use crate::error::DaemonError;
use crate::state::DaemonState;

/// Move the filter to `level` and reconcile every connection.
///
/// Failure to open the client listener requests daemon exit.
pub fn apply_filter_level(
    state: &mut DaemonState,
    events: &mut EventHandler,
    level: FilterLevel,
) -> Result<LevelChange, DaemonError> {
    let change = state.filter.change_level(level)?;
    if let Err(e) = ensure_client_listener(state, events) {
        error!(error = %e, "Cannot provide client listener");
        state.exit.request();
        return Err(e);
    }
    events.reconcile_types(&state.filter, ClientMask::ALL)?;
    debug!(
        level,
        changed = ?change.changed_types().iter().collect::<Vec<_>>(),
        "Filter level applied"
    );
    Ok(change)
}

fn ensure_client_listener(
    state: &mut DaemonState,
    events: &mut EventHandler,
) -> Result<(), DaemonError> {
    if !state.filter.connection_allowed(ConnectionType::ClientConnect) {
        return Ok(());
    }

    // Listeners torn down by the dispatch loop no longer own their address.
    state.listeners.retain(|(id, _)| events.connection(*id).is_some());

    for ip in state.config.listen_addresses() {
        let addr = SocketAddr::new(ip, state.config.port);
        let known = state
            .listeners
            .iter()
            .find(|(_, bound)| *bound == ip)
            .map(|(id, _)| *id);
        match known {
            Some(id) => {
                let released = events.connection(id).is_some_and(|c| c.fd().is_none());
                if released {
                    let listener = open_tcp_listener(addr)?;
                    events.assign_receiver(id, Endpoint::TcpListener(listener))?;
                }
            }
            None => {
                let listener = open_tcp_listener(addr)?;
                let id = events.register_connection(
                    &state.filter,
                    ConnectionType::ClientConnect,
                    Receiver::new(Endpoint::TcpListener(listener)),
                    PollFlags::POLLIN,
                )?;
                state.listeners.push((id, ip));
            }
        }
    }
    Ok(())
}
