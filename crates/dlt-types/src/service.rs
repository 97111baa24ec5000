//! # Control Service Identifiers
//!
//! Service ids carried by control messages, the two id banks the control
//! bitset covers, and the generic response status codes.

use serde::{Deserialize, Serialize};

use crate::errors::TypesError;

/// Numeric control service identifier.
pub type ServiceId = u32;

// =============================================================================
// LOWER BANK: standard services
// =============================================================================

pub const SET_LOG_LEVEL: ServiceId = 0x01;
pub const SET_TRACE_STATUS: ServiceId = 0x02;
pub const GET_LOG_INFO: ServiceId = 0x03;
pub const GET_DEFAULT_LOG_LEVEL: ServiceId = 0x04;
pub const STORE_CONFIGURATION: ServiceId = 0x05;
pub const RESET_TO_FACTORY_DEFAULT: ServiceId = 0x06;
pub const SET_MESSAGE_FILTERING: ServiceId = 0x0A;
pub const SET_DEFAULT_LOG_LEVEL: ServiceId = 0x11;
pub const SET_DEFAULT_TRACE_STATUS: ServiceId = 0x12;
pub const GET_SOFTWARE_VERSION: ServiceId = 0x13;
pub const GET_DEFAULT_TRACE_STATUS: ServiceId = 0x15;
pub const GET_LOG_CHANNEL_NAMES: ServiceId = 0x17;
pub const GET_TRACE_STATUS: ServiceId = 0x1F;

/// First id past the lower bank.
pub const SERVICE_ID_LAST_ENTRY: ServiceId = 0x21;

// =============================================================================
// UPPER BANK: daemon specific services
// =============================================================================

/// Class bits selecting the upper bank.
pub const USER_SERVICE_ID: ServiceId = 0xF00;

pub const UNREGISTER_CONTEXT: ServiceId = 0xF01;
pub const CONNECTION_INFO: ServiceId = 0xF02;
pub const TIMEZONE: ServiceId = 0xF03;
pub const MARKER: ServiceId = 0xF04;
pub const OFFLINE_LOGSTORAGE: ServiceId = 0xF05;
pub const PASSIVE_NODE_CONNECT: ServiceId = 0xF06;
pub const PASSIVE_NODE_CONNECTION_STATUS: ServiceId = 0xF07;
pub const SET_ALL_LOG_LEVEL: ServiceId = 0xF08;
pub const SET_ALL_TRACE_STATUS: ServiceId = 0xF09;
/// Change the active filter level. Payload: one little-endian `u32` level.
pub const SET_FILTER_LEVEL: ServiceId = 0xF0A;
/// Query the active filter level and segment name.
pub const GET_FILTER_STATUS: ServiceId = 0xF0B;

/// First id past the upper bank.
pub const USER_SERVICE_ID_LAST_ENTRY: ServiceId = 0xF0C;

// =============================================================================
// INJECTIONS
// =============================================================================

/// Lowest service id that denotes an injection request.
pub const CALLSW_CINJECTION: ServiceId = 0xFFF;

/// Check whether a service id addresses an injection.
#[must_use]
pub const fn is_injection(id: ServiceId) -> bool {
    id >= CALLSW_CINJECTION
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Generic accept/deny status returned for every control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ServiceResponse {
    Ok = 0,
    NotSupported = 1,
    Error = 2,
    PermDenied = 3,
}

impl ServiceResponse {
    /// Wire byte for this status.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ServiceResponse {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, TypesError> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::NotSupported),
            2 => Ok(Self::Error),
            3 => Ok(Self::PermDenied),
            other => Err(TypesError::UnknownResponse(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_services_live_in_upper_bank() {
        for id in [SET_FILTER_LEVEL, GET_FILTER_STATUS] {
            assert_eq!(id & USER_SERVICE_ID, USER_SERVICE_ID);
            assert!(id < USER_SERVICE_ID_LAST_ENTRY);
        }
    }

    #[test]
    fn test_injection_threshold() {
        assert!(!is_injection(USER_SERVICE_ID_LAST_ENTRY));
        assert!(is_injection(CALLSW_CINJECTION));
        assert!(is_injection(0x1000));
    }

    #[test]
    fn test_response_from_byte() {
        assert_eq!(ServiceResponse::try_from(3), Ok(ServiceResponse::PermDenied));
        assert_eq!(
            ServiceResponse::try_from(9),
            Err(TypesError::UnknownResponse(9))
        );
    }
}
