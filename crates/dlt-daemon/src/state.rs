//! State shared by every connection handler.

use std::net::IpAddr;

use dlt_filter::MessageFilter;
use dlt_types::{ConnectionId, ConnectionType};

use crate::backend::BackendEvents;
use crate::config::DaemonConfig;
use crate::exit::ExitFlag;

/// Counters reported by the statistics timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub app_bytes: u64,
    pub forwarded: u64,
    pub control_requests: u64,
    pub denied_requests: u64,
    pub accepted: [u64; ConnectionType::COUNT],
}

#[derive(Debug)]
pub struct DaemonState {
    pub config: DaemonConfig,
    pub filter: MessageFilter,
    pub exit: ExitFlag,
    pub backend: Option<BackendEvents>,
    pub stats: DaemonStats,
    /// Client listener connections and the address each one serves.
    pub listeners: Vec<(ConnectionId, IpAddr)>,
}

impl DaemonState {
    pub fn new(config: DaemonConfig, filter: MessageFilter, exit: ExitFlag) -> Self {
        Self {
            config,
            filter,
            exit,
            backend: None,
            stats: DaemonStats::default(),
            listeners: Vec::new(),
        }
    }
}
