//! # Message Filter Service
//!
//! Owns the segment chain and the injection registry and tracks which
//! segment is active. Every allow query is answered against the active
//! segment only.
//!
//! ## Level changes
//!
//! [`MessageFilter::change_level`] moves the active segment and reports the
//! client masks before and after, so that the caller can reconcile open
//! endpoints with the new policy.

mod builder;

use dlt_types::{ClientMask, ConnectionType, FilterLevel, ServiceId, LEVEL_MAX};
use tracing::{debug, info};

use crate::domain::{FilterSegment, InjectionRegistry, InjectionWhitelist, SegmentChain};
use crate::error::FilterError;

pub use builder::check_level;

/// Outcome of a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub previous_level: FilterLevel,
    pub level: FilterLevel,
    pub previous_mask: ClientMask,
    pub current_mask: ClientMask,
    /// Whether a different segment became active.
    pub segment_changed: bool,
}

impl LevelChange {
    /// Connection types whose allow-bit differs between the two masks.
    #[must_use]
    pub fn changed_types(&self) -> ClientMask {
        self.previous_mask.difference(self.current_mask)
    }
}

/// The level-based message filter.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    name: String,
    chain: SegmentChain,
    current: usize,
    default_level: FilterLevel,
    level: FilterLevel,
    backend: Option<String>,
    injections: InjectionRegistry,
}

impl MessageFilter {
    /// Assemble a filter from an already closed chain.
    ///
    /// The chain is validated and `default_level` resolved to its segment.
    pub fn new(
        name: impl Into<String>,
        chain: SegmentChain,
        injections: InjectionRegistry,
        default_level: FilterLevel,
        backend: Option<String>,
    ) -> Result<Self, FilterError> {
        chain.validate()?;
        let default_level = check_level(i64::from(default_level))?;
        let current = chain
            .find(default_level)
            .ok_or(FilterError::NoSegmentForLevel {
                level: default_level,
            })?;

        for segment in chain.iter() {
            for injection in segment.injections.names() {
                if !injections.contains(injection) {
                    return Err(FilterError::UnknownInjection {
                        filter: segment.name.clone(),
                        injection: injection.clone(),
                    });
                }
            }
        }

        let filter = Self {
            name: name.into(),
            chain,
            current,
            default_level,
            level: default_level,
            backend,
            injections,
        };
        info!(
            filter = %filter.name,
            segments = filter.chain.len(),
            injections = filter.injections.len(),
            level = default_level,
            segment = %filter.current_segment().name,
            "Message filter initialised"
        );
        Ok(filter)
    }

    /// Filter with one segment that allows everything, starting at `LEVEL_MAX`.
    pub fn permissive(name: impl Into<String>) -> Result<Self, FilterError> {
        let name = name.into();
        let mut chain = SegmentChain::new();
        chain.insert(FilterSegment::permissive(name.clone()))?;
        Self::new(name, chain, InjectionRegistry::new(), LEVEL_MAX, None)
    }

    /// Active segment.
    pub fn current_segment(&self) -> &FilterSegment {
        // `current` is always a valid index: it is only ever assigned from
        // `SegmentChain::find` on the owned, never-shrinking chain.
        &self.chain.as_slice()[self.current]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> FilterLevel {
        self.level
    }

    pub fn default_level(&self) -> FilterLevel {
        self.default_level
    }

    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    pub fn chain(&self) -> &SegmentChain {
        &self.chain
    }

    pub fn injections(&self) -> &InjectionRegistry {
        &self.injections
    }

    /// Client mask of the active segment.
    pub fn client_mask(&self) -> ClientMask {
        self.current_segment().client_mask
    }

    /// Check whether connections of `ty` may be active.
    pub fn connection_allowed(&self, ty: ConnectionType) -> bool {
        self.current_segment().allows_connection(ty)
    }

    /// Check whether a control message may be served.
    ///
    /// Ids outside both control banks are an error, not a denial.
    pub fn control_allowed(&self, id: ServiceId) -> Result<bool, FilterError> {
        self.current_segment().allows_control(id)
    }

    /// Check whether an injection request may be forwarded.
    pub fn injection_allowed(
        &self,
        app_id: &str,
        context_id: &str,
        node_id: &str,
        service_id: ServiceId,
    ) -> Result<bool, FilterError> {
        let names = match &self.current_segment().injections {
            InjectionWhitelist::Nothing => return Ok(false),
            InjectionWhitelist::All => return Ok(true),
            InjectionWhitelist::Names(names) => names,
        };

        for name in names {
            let config = self.injections.get(name).ok_or_else(|| {
                FilterError::Internal(format!("whitelisted injection '{name}' is not registered"))
            })?;
            if config.matches(app_id, context_id, node_id, service_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Select the segment responsible for `level`.
    pub fn change_level(&mut self, level: FilterLevel) -> Result<LevelChange, FilterError> {
        let level = check_level(i64::from(level))?;
        let next = self
            .chain
            .find(level)
            .ok_or(FilterError::NoSegmentForLevel { level })?;

        let previous_level = self.level;
        let previous_mask = self.client_mask();
        let segment_changed = next != self.current;
        self.current = next;
        self.level = level;

        let change = LevelChange {
            previous_level,
            level,
            previous_mask,
            current_mask: self.client_mask(),
            segment_changed,
        };

        if segment_changed {
            info!(
                from = previous_level,
                level,
                segment = %self.current_segment().name,
                "Filter level changed"
            );
        } else {
            debug!(from = previous_level, level, "Filter level changed within segment");
        }
        Ok(change)
    }
}
