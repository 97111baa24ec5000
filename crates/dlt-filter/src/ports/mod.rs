//! # Ports Layer
//!
//! The configuration source the message filter is built from. Sections are
//! plain parsed values; the list fields still carry raw token strings which
//! the builder interprets.
//!
//! - `TomlFilterConfig` (adapters/toml_config.rs) reads a TOML file.
//! - `StaticFilterConfig` (adapters/static_config.rs) holds sections built in code.

use serde::Deserialize;

use crate::error::FilterError;

fn none_token() -> String {
    crate::domain::tokens::NONE_TOKEN.to_string()
}

/// General section: filter name, default level and optional backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralSection {
    pub name: String,
    /// Signed so that negative values reach validation instead of failing
    /// deserialization with an opaque message.
    pub default_level: i64,
    #[serde(default)]
    pub backend: Option<String>,
}

/// One filter segment as configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterSection {
    pub name: String,
    pub level: i64,
    #[serde(default = "none_token")]
    pub clients: String,
    #[serde(default = "none_token")]
    pub control_messages: String,
    #[serde(default = "none_token")]
    pub injections: String,
}

/// One injection record as configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InjectionSection {
    pub name: String,
    pub app_id: String,
    pub context_id: String,
    pub node_id: String,
    pub service_ids: String,
}

/// Source of filter configuration sections.
pub trait FilterConfigProvider {
    fn general(&self) -> Result<GeneralSection, FilterError>;

    fn filters(&self) -> Result<Vec<FilterSection>, FilterError>;

    fn injections(&self) -> Result<Vec<InjectionSection>, FilterError>;
}
