//! A single filter segment: the policy applied over one contiguous level range.

use dlt_types::{ClientMask, ConnectionType, FilterLevel, ServiceId, LEVEL_MAX};

use super::bitset::ServiceBitset;
use crate::error::FilterError;

/// Injection whitelist of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InjectionWhitelist {
    /// Every injection is allowed.
    All,
    /// No injection is allowed.
    #[default]
    Nothing,
    /// Only the named injections are allowed.
    Names(Vec<String>),
}

impl InjectionWhitelist {
    /// Names referenced by this whitelist, empty for the sentinels.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Names(names) => names,
            Self::All | Self::Nothing => &[],
        }
    }
}

/// Policy segment covering `[level_min, level_max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSegment {
    pub name: String,
    pub level_min: FilterLevel,
    pub level_max: FilterLevel,
    pub client_mask: ClientMask,
    pub ctrl_mask: ServiceBitset,
    pub injections: InjectionWhitelist,
}

impl FilterSegment {
    /// Create a segment ending at `level_max`. The lower bound is assigned
    /// when the segment is placed in a chain.
    pub fn new(
        name: impl Into<String>,
        level_max: FilterLevel,
        client_mask: ClientMask,
        ctrl_mask: ServiceBitset,
        injections: InjectionWhitelist,
    ) -> Result<Self, FilterError> {
        if level_max > LEVEL_MAX {
            return Err(FilterError::LevelOutOfRange {
                level: i64::from(level_max),
                max: LEVEL_MAX,
            });
        }
        Ok(Self {
            name: name.into(),
            level_min: 0,
            level_max,
            client_mask,
            ctrl_mask,
            injections,
        })
    }

    /// Segment spanning the whole level range that denies everything except
    /// the default connection types.
    pub fn restrictive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level_min: 0,
            level_max: LEVEL_MAX,
            client_mask: ClientMask::DEFAULT,
            ctrl_mask: ServiceBitset::new(),
            injections: InjectionWhitelist::Nothing,
        }
    }

    /// Segment spanning the whole level range that allows everything.
    pub fn permissive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level_min: 0,
            level_max: LEVEL_MAX,
            client_mask: ClientMask::ALL,
            ctrl_mask: ServiceBitset::all(),
            injections: InjectionWhitelist::All,
        }
    }

    /// Check whether `level` lies inside this segment.
    #[must_use]
    pub fn contains(&self, level: FilterLevel) -> bool {
        (self.level_min..=self.level_max).contains(&level)
    }

    #[must_use]
    pub fn allows_connection(&self, ty: ConnectionType) -> bool {
        self.client_mask.contains(ty)
    }

    pub fn allows_control(&self, id: ServiceId) -> Result<bool, FilterError> {
        self.ctrl_mask.test(id)
    }
}
