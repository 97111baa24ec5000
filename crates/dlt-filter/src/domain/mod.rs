//! # Domain Layer
//!
//! Pure policy types: the control id bitset, filter segments and their
//! ordered chain, the injection registry and the list token grammar.

pub mod bitset;
pub mod chain;
pub mod injection;
pub mod segment;
pub mod tokens;

pub use bitset::ServiceBitset;
pub use chain::SegmentChain;
pub use injection::{InjectionConfig, InjectionRegistry};
pub use segment::{FilterSegment, InjectionWhitelist};
