//! In-memory configuration provider.

use crate::error::FilterError;
use crate::ports::{FilterConfigProvider, FilterSection, GeneralSection, InjectionSection};

/// Sections assembled in code.
#[derive(Debug, Clone)]
pub struct StaticFilterConfig {
    pub general: GeneralSection,
    pub filters: Vec<FilterSection>,
    pub injections: Vec<InjectionSection>,
}

impl StaticFilterConfig {
    pub fn new(name: impl Into<String>, default_level: i64) -> Self {
        Self {
            general: GeneralSection {
                name: name.into(),
                default_level,
                backend: None,
            },
            filters: Vec::new(),
            injections: Vec::new(),
        }
    }

    /// Append a filter section.
    #[must_use]
    pub fn with_filter(
        mut self,
        name: &str,
        level: i64,
        clients: &str,
        control_messages: &str,
        injections: &str,
    ) -> Self {
        self.filters.push(FilterSection {
            name: name.to_string(),
            level,
            clients: clients.to_string(),
            control_messages: control_messages.to_string(),
            injections: injections.to_string(),
        });
        self
    }

    /// Append an injection section.
    #[must_use]
    pub fn with_injection(
        mut self,
        name: &str,
        app_id: &str,
        context_id: &str,
        node_id: &str,
        service_ids: &str,
    ) -> Self {
        self.injections.push(InjectionSection {
            name: name.to_string(),
            app_id: app_id.to_string(),
            context_id: context_id.to_string(),
            node_id: node_id.to_string(),
            service_ids: service_ids.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &str) -> Self {
        self.general.backend = Some(backend.to_string());
        self
    }
}

impl FilterConfigProvider for StaticFilterConfig {
    fn general(&self) -> Result<GeneralSection, FilterError> {
        Ok(self.general.clone())
    }

    fn filters(&self) -> Result<Vec<FilterSection>, FilterError> {
        Ok(self.filters.clone())
    }

    fn injections(&self) -> Result<Vec<InjectionSection>, FilterError> {
        Ok(self.injections.clone())
    }
}
