//! Named injection records referenced by filter segments.

use std::collections::{BTreeMap, BTreeSet};

use dlt_types::ServiceId;

/// Exact-match allow tuple for one injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionConfig {
    pub name: String,
    pub app_id: String,
    pub context_id: String,
    pub node_id: String,
    pub service_ids: BTreeSet<ServiceId>,
}

impl InjectionConfig {
    /// Check whether a request targets this injection.
    #[must_use]
    pub fn matches(&self, app_id: &str, context_id: &str, node_id: &str, service_id: ServiceId) -> bool {
        self.app_id == app_id
            && self.context_id == context_id
            && self.node_id == node_id
            && self.service_ids.contains(&service_id)
    }
}

/// Injection records keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InjectionRegistry {
    entries: BTreeMap<String, InjectionConfig>,
}

impl InjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns `false` and keeps the existing record when the
    /// name is already taken.
    pub fn insert(&mut self, config: InjectionConfig) -> bool {
        if self.entries.contains_key(&config.name) {
            return false;
        }
        self.entries.insert(config.name.clone(), config);
        true
    }

    pub fn get(&self, name: &str) -> Option<&InjectionConfig> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InjectionConfig> {
        self.entries.values()
    }
}
