//! # Adapters
//!
//! - `nix_poller` - `poll(2)` through the `nix` crate
//! - `scripted_poller` - deterministic readiness for tests (`test-utils`)

pub mod nix_poller;
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted_poller;

pub use nix_poller::NixPoller;
#[cfg(any(test, feature = "test-utils"))]
pub use scripted_poller::ScriptedPoller;
