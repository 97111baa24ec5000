//! Two-bank bitset over control service identifiers.
//!
//! The lower bank covers the standard services `0x01..SERVICE_ID_LAST_ENTRY`,
//! the upper bank the daemon specific services
//! `USER_SERVICE_ID+1..USER_SERVICE_ID_LAST_ENTRY`. The class bits of the id
//! (`0xF00`) select the bank, the low eight bits select byte and bit.
//!
//! INVARIANTS:
//! - Ids outside both banks are rejected and never mutate state.

use dlt_types::service::{SERVICE_ID_LAST_ENTRY, USER_SERVICE_ID, USER_SERVICE_ID_LAST_ENTRY};
use dlt_types::ServiceId;

use crate::error::FilterError;

/// Bytes per bank (256 ids).
pub const BANK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bank {
    Lower,
    Upper,
}

/// Allow-set over control service ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceBitset {
    lower: [u8; BANK_SIZE],
    upper: [u8; BANK_SIZE],
}

impl ServiceBitset {
    /// Create an empty bitset (every id denied).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bitset with every id allowed.
    pub fn all() -> Self {
        let mut set = Self::new();
        set.enable_all();
        set
    }

    /// Check whether an id belongs to one of the two banks.
    #[must_use]
    pub fn is_valid_id(id: ServiceId) -> bool {
        Self::locate(id).is_ok()
    }

    fn locate(id: ServiceId) -> Result<(Bank, usize, u8), FilterError> {
        let bank = if (0x01..SERVICE_ID_LAST_ENTRY).contains(&id) {
            Bank::Lower
        } else if id & USER_SERVICE_ID == USER_SERVICE_ID
            && id > USER_SERVICE_ID
            && id < USER_SERVICE_ID_LAST_ENTRY
        {
            Bank::Upper
        } else {
            return Err(FilterError::ServiceIdOutOfRange { id });
        };

        let byte = ((id & 0xFF) >> 3) as usize;
        let bit = (id & 0x07) as u8;
        Ok((bank, byte, bit))
    }

    fn bank(&self, bank: Bank) -> &[u8; BANK_SIZE] {
        match bank {
            Bank::Lower => &self.lower,
            Bank::Upper => &self.upper,
        }
    }

    fn bank_mut(&mut self, bank: Bank) -> &mut [u8; BANK_SIZE] {
        match bank {
            Bank::Lower => &mut self.lower,
            Bank::Upper => &mut self.upper,
        }
    }

    /// Allow an id.
    pub fn set(&mut self, id: ServiceId) -> Result<(), FilterError> {
        let (bank, byte, bit) = Self::locate(id)?;
        self.bank_mut(bank)[byte] |= 1 << bit;
        Ok(())
    }

    /// Check whether an id is allowed.
    pub fn test(&self, id: ServiceId) -> Result<bool, FilterError> {
        let (bank, byte, bit) = Self::locate(id)?;
        Ok(self.bank(bank)[byte] & (1 << bit) != 0)
    }

    /// Allow every id in both banks.
    pub fn enable_all(&mut self) {
        self.lower = [0xFF; BANK_SIZE];
        self.upper = [0xFF; BANK_SIZE];
    }

    /// Deny every id in both banks.
    pub fn clear(&mut self) {
        self.lower = [0; BANK_SIZE];
        self.upper = [0; BANK_SIZE];
    }

    /// Check whether no id is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.iter().chain(self.upper.iter()).all(|b| *b == 0)
    }

    /// Iterate over every id either bank can hold.
    pub fn legal_ids() -> impl Iterator<Item = ServiceId> {
        (0x01..SERVICE_ID_LAST_ENTRY).chain(USER_SERVICE_ID + 1..USER_SERVICE_ID_LAST_ENTRY)
    }
}
