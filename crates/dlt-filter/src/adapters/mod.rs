//! # Adapters
//!
//! Concrete [`FilterConfigProvider`](crate::ports::FilterConfigProvider)
//! implementations.

pub mod static_config;
pub mod toml_config;

pub use static_config::StaticFilterConfig;
pub use toml_config::TomlFilterConfig;
