//! # Connection Vocabulary
//!
//! Kinds, lifecycle states and identifiers of monitored I/O endpoints, plus
//! the client mask that expresses which kinds a filter segment allows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::TypesError;

// =============================================================================
// CONNECTION TYPE
// =============================================================================

/// Kind of a monitored endpoint.
///
/// The discriminant is the bit position used by [`ClientMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConnectionType {
    /// Listening TCP socket accepting log consumers.
    ClientConnect = 0,
    /// Accepted TCP log consumer.
    ClientMsgTcp = 1,
    /// Serial log consumer.
    ClientMsgSerial = 2,
    /// Listening socket accepting local applications.
    AppConnect = 3,
    /// Accepted local application.
    AppMsg = 4,
    /// Periodic one second timer.
    OneSecondTimer = 5,
    /// Periodic sixty second timer.
    SixtySecondTimer = 6,
    /// Service manager watchdog timer.
    WatchdogTimer = 7,
    /// Listening control socket.
    ControlConnect = 8,
    /// Accepted control client.
    ControlMsg = 9,
    /// Offline trace storage.
    OfflineTrace = 10,
    /// Offline log storage.
    OfflineLogstorage = 11,
    /// External filter level authority.
    FilterBackend = 12,
    /// Gateway to a passive node.
    Gateway = 13,
    /// Gateway reconnect timer.
    GatewayTimer = 14,
}

impl ConnectionType {
    /// Number of connection types.
    pub const COUNT: usize = 15;

    /// Every connection type in discriminant order.
    pub const ALL: [ConnectionType; Self::COUNT] = [
        Self::ClientConnect,
        Self::ClientMsgTcp,
        Self::ClientMsgSerial,
        Self::AppConnect,
        Self::AppMsg,
        Self::OneSecondTimer,
        Self::SixtySecondTimer,
        Self::WatchdogTimer,
        Self::ControlConnect,
        Self::ControlMsg,
        Self::OfflineTrace,
        Self::OfflineLogstorage,
        Self::FilterBackend,
        Self::Gateway,
        Self::GatewayTimer,
    ];

    /// Position of this type in [`ConnectionType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a type by its index.
    pub fn from_index(index: usize) -> Result<Self, TypesError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(TypesError::UnknownConnectionType(index))
    }

    /// Single-bit mask for this type.
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientConnect => "client-connect",
            Self::ClientMsgTcp => "client-msg-tcp",
            Self::ClientMsgSerial => "client-msg-serial",
            Self::AppConnect => "app-connect",
            Self::AppMsg => "app-msg",
            Self::OneSecondTimer => "one-second-timer",
            Self::SixtySecondTimer => "sixty-second-timer",
            Self::WatchdogTimer => "watchdog-timer",
            Self::ControlConnect => "control-connect",
            Self::ControlMsg => "control-msg",
            Self::OfflineTrace => "offline-trace",
            Self::OfflineLogstorage => "offline-logstorage",
            Self::FilterBackend => "filter-backend",
            Self::Gateway => "gateway",
            Self::GatewayTimer => "gateway-timer",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONNECTION STATUS
// =============================================================================

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Not yet initialised.
    #[default]
    Undefined,
    /// Known to the event handler but not polled.
    Inactive,
    /// Present in the readiness table.
    Active,
    /// Deactivation pending.
    DeactivateRequested,
    /// Activation pending.
    ActivateRequested,
}

// =============================================================================
// CONNECTION ID
// =============================================================================

/// Opaque connection identifier. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u32);

impl ConnectionId {
    /// Wrap a raw value. Returns `None` for the reserved value zero.
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// CLIENT MASK
// =============================================================================

/// Bitmask over connection types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClientMask(u32);

impl ClientMask {
    /// Mask with no types set.
    pub const EMPTY: ClientMask = ClientMask(0);

    /// Mask with every type set.
    pub const ALL: ClientMask = ClientMask((1 << ConnectionType::COUNT as u32) - 1);

    /// Types that stay allowed whatever the filter level: internal plumbing
    /// the daemon cannot run without.
    pub const DEFAULT: ClientMask = ClientMask(
        ConnectionType::AppConnect.bit()
            | ConnectionType::AppMsg.bit()
            | ConnectionType::OneSecondTimer.bit()
            | ConnectionType::SixtySecondTimer.bit()
            | ConnectionType::WatchdogTimer.bit()
            | ConnectionType::ControlConnect.bit()
            | ConnectionType::ControlMsg.bit()
            | ConnectionType::FilterBackend.bit()
            | ConnectionType::Gateway.bit()
            | ConnectionType::GatewayTimer.bit(),
    );

    /// Build a mask from raw bits, discarding bits beyond the known types.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Build a mask from a list of types.
    #[must_use]
    pub fn of(types: &[ConnectionType]) -> Self {
        Self(types.iter().fold(0, |acc, t| acc | t.bit()))
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether a type is allowed.
    #[must_use]
    pub const fn contains(self, ty: ConnectionType) -> bool {
        self.0 & ty.bit() != 0
    }

    /// Allow a type.
    pub fn insert(&mut self, ty: ConnectionType) {
        self.0 |= ty.bit();
    }

    /// Union of two masks.
    #[must_use]
    pub const fn union(self, other: ClientMask) -> Self {
        Self(self.0 | other.0)
    }

    /// Types whose allow-bit differs between two masks.
    #[must_use]
    pub const fn difference(self, other: ClientMask) -> Self {
        Self(self.0 ^ other.0)
    }

    /// Check whether no type is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the types set in this mask.
    pub fn iter(self) -> impl Iterator<Item = ConnectionType> {
        ConnectionType::ALL
            .into_iter()
            .filter(move |ty| self.contains(*ty))
    }
}
