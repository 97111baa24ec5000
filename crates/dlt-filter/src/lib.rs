//! # DLT Message Filter
//!
//! Decides, per filter level, which connection types may be active, which
//! control messages may be served and which injection requests may be
//! forwarded.
//!
//! ## Model
//!
//! The level space `[0, LEVEL_MAX]` is partitioned into named segments.
//! Each segment carries a client mask, a control id bitset and an injection
//! whitelist. Exactly one segment is active at a time.
//!
//! ```text
//!  0            49 50                         100
//!  |--- Locked ---|----------- Open -----------|
//!                 ^ change_level(60) activates "Open"
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Coverage | Every level in `[0, LEVEL_MAX]` belongs to exactly one segment |
//! | Unique bounds | No two segments share a `level_max` |
//! | Active segment | The active segment always contains the last level set |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Bitset, segments, chain, injection registry, token grammar
//! - `ports/` - Configuration provider trait and section types
//! - `service/` - `MessageFilter` and its builder
//! - `adapters/` - TOML file and in-memory providers
//!
//! ## Usage
//!
//! ```ignore
//! use dlt_filter::{MessageFilter, TomlFilterConfig};
//!
//! let config = TomlFilterConfig::load("/etc/dlt_message_filter.toml")?;
//! let mut filter = MessageFilter::from_provider(&config)?;
//! let change = filter.change_level(60)?;
//! for ty in change.changed_types().iter() {
//!     // reconcile endpoints of `ty`
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{StaticFilterConfig, TomlFilterConfig};
pub use domain::{
    FilterSegment, InjectionConfig, InjectionRegistry, InjectionWhitelist, SegmentChain,
    ServiceBitset,
};
pub use error::FilterError;
pub use ports::{FilterConfigProvider, FilterSection, GeneralSection, InjectionSection};
pub use service::{check_level, LevelChange, MessageFilter};
