//! TOML file configuration provider.
//!
//! ```toml
//! [general]
//! name = "Vehicle"
//! default_level = 10
//!
//! [[filter]]
//! name = "Locked"
//! level = 49
//! clients = "NONE"
//! control_messages = "0xF0A,0xF0B"
//! injections = "NONE"
//!
//! [[injection]]
//! name = "Diag"
//! app_id = "APP1"
//! context_id = "CTX1"
//! node_id = "ECU1"
//! service_ids = "4096,4097"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::FilterError;
use crate::ports::{FilterConfigProvider, FilterSection, GeneralSection, InjectionSection};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterFile {
    general: GeneralSection,
    #[serde(default)]
    filter: Vec<FilterSection>,
    #[serde(default)]
    injection: Vec<InjectionSection>,
}

/// Parsed filter configuration file.
#[derive(Debug, Clone)]
pub struct TomlFilterConfig {
    file: FilterFile,
}

impl TomlFilterConfig {
    /// Read and parse a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| FilterError::ConfigIo {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let config = Self::parse(&contents)?;
        info!(
            path = %path.display(),
            filters = config.file.filter.len(),
            injections = config.file.injection.len(),
            "Loaded filter configuration"
        );
        Ok(config)
    }

    /// Parse configuration text.
    pub fn parse(contents: &str) -> Result<Self, FilterError> {
        let file: FilterFile =
            toml::from_str(contents).map_err(|e| FilterError::ConfigParse(e.to_string()))?;
        Ok(Self { file })
    }
}

impl FilterConfigProvider for TomlFilterConfig {
    fn general(&self) -> Result<GeneralSection, FilterError> {
        Ok(self.file.general.clone())
    }

    fn filters(&self) -> Result<Vec<FilterSection>, FilterError> {
        Ok(self.file.filter.clone())
    }

    fn injections(&self) -> Result<Vec<InjectionSection>, FilterError> {
        Ok(self.file.injection.clone())
    }
}
