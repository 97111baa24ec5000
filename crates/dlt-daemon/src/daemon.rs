//! # Daemon Lifecycle
//!
//! ```text
//! new ──> open endpoints ──> apply default level ──> run ──> shutdown
//!                                                     │
//!                              exit flag / fatal error┘
//! ```
//!
//! Shutdown unregisters every connection and removes the Unix socket files.
//! It runs at most once, on the way out of [`Daemon::run`] or on drop.

use std::net::SocketAddr;
use std::time::Duration;

use dlt_event_handler::{
    DispatchTable, Endpoint, EventHandler, NixPoller, PollFlags, Poller, Receiver,
};
use dlt_filter::{LevelChange, MessageFilter};
use dlt_types::{ClientMask, ConnectionId, ConnectionType, FilterLevel};
use tracing::{error, info, warn};

use crate::backend::{backend_link, BackendNotifier};
use crate::config::DaemonConfig;
use crate::endpoints::{open_serial, open_unix_listener, periodic_timer, remove_socket};
use crate::error::DaemonError;
use crate::exit::ExitFlag;
use crate::handlers::dispatch_table;
use crate::level::apply_filter_level;
use crate::state::DaemonState;

const ONE_SECOND: Duration = Duration::from_secs(1);
const SIXTY_SECONDS: Duration = Duration::from_secs(60);

pub struct Daemon<P: Poller = NixPoller> {
    state: DaemonState,
    events: EventHandler,
    dispatch: DispatchTable<DaemonState>,
    poller: P,
    notifier: Option<BackendNotifier>,
    shut_down: bool,
}

impl Daemon<NixPoller> {
    pub fn new(
        config: DaemonConfig,
        filter: MessageFilter,
        exit: ExitFlag,
    ) -> Result<Self, DaemonError> {
        Self::with_poller(config, filter, exit, NixPoller::new())
    }
}

impl<P: Poller> Daemon<P> {
    pub fn with_poller(
        config: DaemonConfig,
        filter: MessageFilter,
        exit: ExitFlag,
        poller: P,
    ) -> Result<Self, DaemonError> {
        config.validate()?;
        let mut daemon = Self {
            state: DaemonState::new(config, filter, exit),
            events: EventHandler::new(),
            dispatch: dispatch_table()?,
            poller,
            notifier: None,
            shut_down: false,
        };
        if let Err(e) = daemon.open_endpoints() {
            error!(error = %e, "Daemon initialisation failed");
            daemon.shutdown();
            return Err(e);
        }
        info!(
            ecu_id = %daemon.state.config.ecu_id,
            filter = %daemon.state.filter.name(),
            level = daemon.state.filter.level(),
            connections = daemon.events.connections().count(),
            "Daemon initialised"
        );
        Ok(daemon)
    }

    fn open_endpoints(&mut self) -> Result<(), DaemonError> {
        let app = open_unix_listener(&self.state.config.app_socket)?;
        self.register(ConnectionType::AppConnect, Endpoint::UnixListener(app))?;
        let control = open_unix_listener(&self.state.config.control_socket)?;
        self.register(ConnectionType::ControlConnect, Endpoint::UnixListener(control))?;

        self.register(
            ConnectionType::OneSecondTimer,
            Endpoint::Timer(periodic_timer(ONE_SECOND)?),
        )?;
        self.register(
            ConnectionType::SixtySecondTimer,
            Endpoint::Timer(periodic_timer(SIXTY_SECONDS)?),
        )?;
        if let Some(secs) = self.state.config.watchdog_interval_secs {
            self.register(
                ConnectionType::WatchdogTimer,
                Endpoint::Timer(periodic_timer(Duration::from_secs(secs))?),
            )?;
        }

        if let Some(path) = self.state.config.serial_device.clone() {
            match open_serial(&path) {
                Ok(file) => {
                    self.register(ConnectionType::ClientMsgSerial, Endpoint::File(file))?;
                }
                Err(e) => warn!(error = %e, "Serial device unavailable"),
            }
        }

        if let Some(backend) = self.state.filter.backend().map(str::to_owned) {
            let (notifier, queue, wake) = backend_link()?;
            self.register(ConnectionType::FilterBackend, Endpoint::UnixStream(wake))?;
            self.state.backend = Some(queue);
            self.notifier = Some(notifier);
            info!(%backend, "Filter backend link ready");
        }

        let level = self.state.filter.default_level();
        apply_filter_level(&mut self.state, &mut self.events, level)?;
        Ok(())
    }

    fn register(&mut self, ty: ConnectionType, endpoint: Endpoint) -> Result<ConnectionId, DaemonError> {
        Ok(self.events.register_connection(
            &self.state.filter,
            ty,
            Receiver::new(endpoint),
            PollFlags::POLLIN,
        )?)
    }

    pub fn state(&self) -> &DaemonState {
        &self.state
    }

    pub fn events(&self) -> &EventHandler {
        &self.events
    }

    pub fn poller(&self) -> &P {
        &self.poller
    }

    pub fn poller_mut(&mut self) -> &mut P {
        &mut self.poller
    }

    pub fn exit_flag(&self) -> ExitFlag {
        self.state.exit.clone()
    }

    /// Handle for the filter backend, present when the filter names one.
    pub fn backend_notifier(&self) -> Option<BackendNotifier> {
        self.notifier.clone()
    }

    /// Addresses the client listeners are bound to.
    pub fn client_addresses(&self) -> Vec<SocketAddr> {
        self.events
            .connection_ids_of(ClientMask::of(&[ConnectionType::ClientConnect]))
            .into_iter()
            .filter_map(|id| self.events.connection(id))
            .filter_map(|c| match c.receiver()?.endpoint()? {
                Endpoint::TcpListener(l) => l.local_addr().ok(),
                _ => None,
            })
            .collect()
    }

    pub fn set_filter_level(&mut self, level: FilterLevel) -> Result<LevelChange, DaemonError> {
        apply_filter_level(&mut self.state, &mut self.events, level)
    }

    /// Wait once and dispatch. Returns the number of handler invocations.
    pub fn run_once(&mut self) -> Result<usize, DaemonError> {
        let timeout = self.state.config.poll_timeout();
        Ok(self
            .events
            .handle_events(&mut self.state, &self.dispatch, &mut self.poller, timeout)?)
    }

    /// Run until exit is requested or dispatch fails.
    pub fn run(&mut self) -> Result<(), DaemonError> {
        info!("Daemon running");
        while !self.state.exit.is_requested() {
            if let Err(e) = self.run_once() {
                error!(error = %e, "Event loop failed");
                self.state.exit.request();
                self.shutdown();
                return Err(e);
            }
        }
        self.shutdown();
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.events.cleanup();
        for path in [&self.state.config.app_socket, &self.state.config.control_socket] {
            if let Err(e) = remove_socket(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove socket");
            }
        }
        info!("Daemon shut down");
    }
}

impl<P: Poller> Drop for Daemon<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
