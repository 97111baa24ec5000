//! # Daemon Lifecycle
//!
//! Full daemon instances over real sockets in a temporary directory.

#[cfg(test)]
mod tests {
    use std::io::{ErrorKind, Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use std::os::unix::net::UnixStream;
    use std::path::Path;

    use bytes::BytesMut;
    use dlt_daemon::{
        BackendEvent, ControlRequest, ControlResponse, Daemon, DaemonConfig, ExitFlag,
    };
    use dlt_event_handler::{PollFlags, ScriptedPoller};
    use dlt_filter::{MessageFilter, StaticFilterConfig};
    use dlt_types::service::{GET_FILTER_STATUS, SET_FILTER_LEVEL};
    use dlt_types::{ConnectionType, ServiceResponse};
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn config_in(dir: &Path) -> DaemonConfig {
        DaemonConfig {
            port: 0,
            bind_addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            app_socket: dir.join("app.sock"),
            control_socket: dir.join("ctrl.sock"),
            poll_timeout_ms: 20,
            ..DaemonConfig::default()
        }
    }

    fn vehicle_filter(backend: bool) -> MessageFilter {
        let mut provider = StaticFilterConfig::new("Vehicle", 10)
            .with_filter("Locked", 49, "NONE", "0xF0A,0xF0B", "NONE")
            .with_filter("Open", 100, "TCP", "*", "NONE");
        if backend {
            provider = provider.with_backend("security-manager");
        }
        MessageFilter::from_provider(&provider).unwrap()
    }

    fn start(backend: bool) -> (TempDir, Daemon) {
        let dir = tempfile::tempdir().unwrap();
        let daemon = Daemon::new(
            config_in(dir.path()),
            vehicle_filter(backend),
            ExitFlag::new(),
        )
        .unwrap();
        (dir, daemon)
    }

    /// Run the loop until `peer` yields a complete response.
    fn exchange(daemon: &mut Daemon, peer: &mut UnixStream, request: ControlRequest) -> ControlResponse {
        peer.write_all(&request.encode()).unwrap();
        let mut buf = BytesMut::new();
        let mut chunk = [0u8; 256];
        for _ in 0..50 {
            daemon.run_once().unwrap();
            match peer.read(&mut chunk) {
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => panic!("read failed: {e}"),
            }
            if let Some((response, _)) = ControlResponse::decode(&buf).unwrap() {
                return response;
            }
        }
        panic!("no response from daemon");
    }

    fn control_client(dir: &Path) -> UnixStream {
        let peer = UnixStream::connect(dir.join("ctrl.sock")).unwrap();
        peer.set_nonblocking(true).unwrap();
        peer
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    #[test]
    fn test_startup_registers_core_endpoints() {
        let (dir, daemon) = start(false);
        let events = daemon.events();
        for ty in [
            ConnectionType::AppConnect,
            ConnectionType::ControlConnect,
            ConnectionType::OneSecondTimer,
            ConnectionType::SixtySecondTimer,
        ] {
            assert_eq!(events.connection_count(ty), 1, "{ty}");
        }
        assert_eq!(events.connection_count(ConnectionType::WatchdogTimer), 0);
        assert_eq!(events.connection_count(ConnectionType::ClientConnect), 0);
        assert!(daemon.backend_notifier().is_none());
        assert_eq!(events.table().nfds(), 4);
        assert!(dir.path().join("app.sock").exists());
    }

    #[test]
    fn test_shutdown_removes_socket_files() {
        let (dir, mut daemon) = start(false);
        daemon.exit_flag().request();
        daemon.run().unwrap();
        assert_eq!(daemon.events().table().nfds(), 0);
        assert!(!dir.path().join("app.sock").exists());
        assert!(!dir.path().join("ctrl.sock").exists());
    }

    #[test]
    fn test_control_socket_in_missing_directory_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig {
            control_socket: dir.path().join("missing").join("ctrl.sock"),
            ..config_in(dir.path())
        };
        let result = Daemon::new(config, vehicle_filter(false), ExitFlag::new());
        assert!(result.is_err());
        assert!(!dir.path().join("app.sock").exists());
    }

    #[test]
    fn test_scripted_readiness_is_dispatched_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut daemon = Daemon::with_poller(
            config_in(dir.path()),
            vehicle_filter(false),
            ExitFlag::new(),
            ScriptedPoller::new(),
        )
        .unwrap();
        let timer = daemon
            .events()
            .find_by_type(ConnectionType::SixtySecondTimer)
            .unwrap();
        let timer_fd = daemon.events().connection(timer).unwrap().fd().unwrap();

        // Reported readable before expiry: acknowledged without error.
        daemon
            .poller_mut()
            .push_round(vec![(timer_fd, PollFlags::POLLIN)])
            .push_round(vec![(timer_fd, PollFlags::POLLERR)]);
        assert_eq!(daemon.run_once().unwrap(), 1);

        assert_eq!(daemon.run_once().unwrap(), 0);
        assert!(daemon.events().connection(timer).is_none());
        assert!(!daemon.events().table().contains(timer_fd));
        assert_eq!(daemon.poller().calls(), 2);
    }

    // =============================================================================
    // CONTROL SERVICE
    // =============================================================================

    #[test]
    fn test_control_client_raises_level_and_clients_connect() {
        let (dir, mut daemon) = start(false);
        let mut peer = control_client(dir.path());

        let status = exchange(
            &mut daemon,
            &mut peer,
            ControlRequest::new(GET_FILTER_STATUS, Vec::new()),
        );
        assert_eq!(status.status, ServiceResponse::Ok);
        assert_eq!(&status.payload[4..], b"Locked");
        assert!(daemon.client_addresses().is_empty());

        let raised = exchange(
            &mut daemon,
            &mut peer,
            ControlRequest::new(SET_FILTER_LEVEL, 60u32.to_le_bytes().to_vec()),
        );
        assert_eq!(raised.status, ServiceResponse::Ok);
        assert_eq!(daemon.state().filter.level(), 60);

        let addrs = daemon.client_addresses();
        assert_eq!(addrs.len(), 1);
        let _client = TcpStream::connect(addrs[0]).unwrap();
        for _ in 0..50 {
            daemon.run_once().unwrap();
            if daemon.events().connection_count(ConnectionType::ClientMsgTcp) == 1 {
                break;
            }
        }
        assert_eq!(daemon.events().connection_count(ConnectionType::ClientMsgTcp), 1);
    }

    #[test]
    fn test_app_output_is_forwarded_to_tcp_client() {
        let (dir, mut daemon) = start(false);
        daemon.set_filter_level(60).unwrap();
        let mut client = TcpStream::connect(daemon.client_addresses()[0]).unwrap();
        client.set_nonblocking(true).unwrap();
        let mut app = UnixStream::connect(dir.path().join("app.sock")).unwrap();

        for _ in 0..50 {
            daemon.run_once().unwrap();
            let events = daemon.events();
            if events.connection_count(ConnectionType::ClientMsgTcp) == 1
                && events.connection_count(ConnectionType::AppMsg) == 1
            {
                break;
            }
        }
        app.write_all(b"hello").unwrap();

        let mut received = Vec::new();
        let mut chunk = [0u8; 64];
        for _ in 0..50 {
            daemon.run_once().unwrap();
            match client.read(&mut chunk) {
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => panic!("read failed: {e}"),
            }
            if received.len() >= 5 {
                break;
            }
        }
        assert_eq!(received, b"hello");
    }

    // =============================================================================
    // FILTER BACKEND
    // =============================================================================

    #[test]
    fn test_backend_drives_filter_level() {
        let (_dir, mut daemon) = start(true);
        let notifier = daemon.backend_notifier().unwrap();
        assert_eq!(
            daemon.events().connection_count(ConnectionType::FilterBackend),
            1
        );

        notifier.notify(BackendEvent::LevelChanged(90)).unwrap();
        for _ in 0..50 {
            daemon.run_once().unwrap();
            if daemon.state().filter.level() == 90 {
                break;
            }
        }
        assert_eq!(daemon.state().filter.level(), 90);
        assert_eq!(daemon.client_addresses().len(), 1);

        notifier.notify(BackendEvent::Disconnected).unwrap();
        for _ in 0..50 {
            daemon.run_once().unwrap();
            if daemon.state().filter.level() == 10 {
                break;
            }
        }
        assert_eq!(daemon.state().filter.level(), 10);
        assert!(daemon.client_addresses().is_empty());
    }
}
