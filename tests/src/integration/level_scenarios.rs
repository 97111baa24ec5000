//! # Level Change Scenarios
//!
//! The filter level decides which connection types are polled. These tests
//! drive [`apply_filter_level`] against a live [`EventHandler`] and check the
//! readiness table after every step.

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use std::os::unix::net::UnixStream;

    use dlt_daemon::{apply_filter_level, DaemonConfig, DaemonState, ExitFlag};
    use dlt_event_handler::{Endpoint, EventHandler, PollFlags, Receiver};
    use dlt_filter::{MessageFilter, StaticFilterConfig};
    use dlt_types::{ClientMask, ConnectionStatus, ConnectionType};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// `[0,49]` denies everything but control, `[50,100]` allows TCP and
    /// every control message.
    fn vehicle_filter() -> MessageFilter {
        let provider = StaticFilterConfig::new("Vehicle", 10)
            .with_filter("Locked", 49, "NONE", "0xF0A,0xF0B", "NONE")
            .with_filter("Open", 100, "TCP", "*", "NONE");
        MessageFilter::from_provider(&provider).unwrap()
    }

    fn loopback_config() -> DaemonConfig {
        DaemonConfig {
            port: 0,
            bind_addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            ..DaemonConfig::default()
        }
    }

    fn start() -> (DaemonState, EventHandler) {
        let mut state = DaemonState::new(loopback_config(), vehicle_filter(), ExitFlag::new());
        let mut events = EventHandler::new();
        apply_filter_level(&mut state, &mut events, 10).unwrap();
        (state, events)
    }

    fn listener_ids(events: &EventHandler) -> Vec<dlt_types::ConnectionId> {
        events.connection_ids_of(ClientMask::of(&[ConnectionType::ClientConnect]))
    }

    fn listener_ips(events: &EventHandler) -> Vec<IpAddr> {
        let mut ips: Vec<_> = listener_ids(events)
            .into_iter()
            .filter_map(|id| match events.connection(id)?.receiver()?.endpoint()? {
                Endpoint::TcpListener(listener) => Some(listener.local_addr().ok()?.ip()),
                _ => None,
            })
            .collect();
        ips.sort();
        ips
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_raising_level_activates_tcp_listener() {
        let (mut state, mut events) = start();
        assert!(!state.filter.connection_allowed(ConnectionType::ClientMsgTcp));
        assert!(listener_ids(&events).is_empty());
        let before = events.table().nfds();

        apply_filter_level(&mut state, &mut events, 60).unwrap();

        assert!(state.filter.connection_allowed(ConnectionType::ClientMsgTcp));
        let ids = listener_ids(&events);
        assert_eq!(ids.len(), 1);
        let listener = events.connection(ids[0]).unwrap();
        assert_eq!(listener.status(), ConnectionStatus::Active);
        assert_eq!(events.table().nfds(), before + 1);
        assert!(events.table().contains(listener.fd().unwrap()));
    }

    #[test]
    fn test_repeating_level_is_idempotent() {
        let (mut state, mut events) = start();
        apply_filter_level(&mut state, &mut events, 60).unwrap();
        let ids = listener_ids(&events);
        let fd = events.connection(ids[0]).unwrap().fd();
        let nfds = events.table().nfds();

        let change = apply_filter_level(&mut state, &mut events, 60).unwrap();
        assert!(!change.segment_changed);
        assert_eq!(listener_ids(&events), ids);
        assert_eq!(events.connection(ids[0]).unwrap().fd(), fd);
        assert_eq!(events.table().nfds(), nfds);
    }

    #[test]
    fn test_lowering_level_closes_listener_but_keeps_connection() {
        let (mut state, mut events) = start();
        apply_filter_level(&mut state, &mut events, 60).unwrap();
        let ids = listener_ids(&events);
        let nfds = events.table().nfds();

        apply_filter_level(&mut state, &mut events, 10).unwrap();
        let listener = events.connection(ids[0]).unwrap();
        assert_eq!(listener.status(), ConnectionStatus::Inactive);
        assert_eq!(listener.fd(), None);
        assert!(listener.receiver().unwrap().is_released());
        assert_eq!(events.table().nfds(), nfds - 1);

        // Allowed again: the same connection gets a fresh socket.
        apply_filter_level(&mut state, &mut events, 75).unwrap();
        assert_eq!(listener_ids(&events), ids);
        let listener = events.connection(ids[0]).unwrap();
        assert_eq!(listener.status(), ConnectionStatus::Active);
        assert!(listener.fd().is_some());
        assert_eq!(events.table().nfds(), nfds);
    }

    #[test]
    fn test_reopened_listener_accepts_clients() {
        let (mut state, mut events) = start();
        apply_filter_level(&mut state, &mut events, 60).unwrap();
        apply_filter_level(&mut state, &mut events, 10).unwrap();
        apply_filter_level(&mut state, &mut events, 60).unwrap();

        let id = listener_ids(&events)[0];
        let addr = match events.connection(id).unwrap().receiver().unwrap().endpoint() {
            Some(Endpoint::TcpListener(listener)) => listener.local_addr().unwrap(),
            other => panic!("unexpected endpoint {other:?}"),
        };
        TcpStream::connect(addr).unwrap();
    }

    #[test]
    fn test_torn_down_listener_is_reopened_on_its_own_address() {
        let first = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let second = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2));
        let config = DaemonConfig {
            bind_addresses: vec![first, second],
            ..loopback_config()
        };
        let mut state = DaemonState::new(config, vehicle_filter(), ExitFlag::new());
        let mut events = EventHandler::new();
        apply_filter_level(&mut state, &mut events, 60).unwrap();
        assert_eq!(listener_ips(&events), vec![first, second]);

        // The dispatch loop drops a listener whose socket reported an error.
        events.unregister_connection(listener_ids(&events)[0]).unwrap();
        assert_eq!(listener_ips(&events), vec![second]);

        apply_filter_level(&mut state, &mut events, 10).unwrap();
        apply_filter_level(&mut state, &mut events, 60).unwrap();
        assert_eq!(listener_ips(&events), vec![first, second]);
        assert_eq!(events.connection_count(ConnectionType::ClientConnect), 2);
        assert_eq!(state.listeners.len(), 2);
    }

    #[test]
    fn test_tcp_clients_follow_policy_without_reconnect() {
        let (mut state, mut events) = start();
        apply_filter_level(&mut state, &mut events, 60).unwrap();

        let (ours, _theirs) = UnixStream::pair().unwrap();
        let client = events
            .register_connection(
                &state.filter,
                ConnectionType::ClientMsgTcp,
                Receiver::new(Endpoint::UnixStream(ours)),
                PollFlags::POLLIN,
            )
            .unwrap();
        assert!(events.connection(client).unwrap().is_active());

        apply_filter_level(&mut state, &mut events, 20).unwrap();
        let conn = events.connection(client).unwrap();
        assert_eq!(conn.status(), ConnectionStatus::Inactive);
        assert!(conn.fd().is_some());

        apply_filter_level(&mut state, &mut events, 50).unwrap();
        assert!(events.connection(client).unwrap().is_active());
    }

    #[test]
    fn test_default_types_survive_every_level() {
        let (mut state, mut events) = start();
        let (ours, _theirs) = UnixStream::pair().unwrap();
        let control = events
            .register_connection(
                &state.filter,
                ConnectionType::ControlMsg,
                Receiver::new(Endpoint::UnixStream(ours)),
                PollFlags::POLLIN,
            )
            .unwrap();

        for level in [0, 49, 50, 100, 0] {
            apply_filter_level(&mut state, &mut events, level).unwrap();
            assert!(events.connection(control).unwrap().is_active(), "level {level}");
        }
    }

    #[test]
    fn test_listener_bind_failure_requests_exit() {
        let taken = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let config = DaemonConfig {
            port: taken.local_addr().unwrap().port(),
            ..loopback_config()
        };
        let exit = ExitFlag::new();
        let mut state = DaemonState::new(config, vehicle_filter(), exit.clone());
        let mut events = EventHandler::new();

        let err = apply_filter_level(&mut state, &mut events, 60).unwrap_err();
        assert!(err.is_fatal());
        assert!(exit.is_requested());
        assert!(listener_ids(&events).is_empty());
    }
}
