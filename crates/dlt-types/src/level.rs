//! Filter levels.
//!
//! A filter level is the security posture of the daemon. Higher levels are
//! generally less restrictive.

/// Filter level in `[0, LEVEL_MAX]`.
pub type FilterLevel = u32;

/// Highest valid filter level.
pub const LEVEL_MAX: FilterLevel = 100;

/// Check that a level lies inside `[0, LEVEL_MAX]`.
#[must_use]
pub const fn is_valid_level(level: FilterLevel) -> bool {
    level <= LEVEL_MAX
}
