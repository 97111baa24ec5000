//! Building a [`MessageFilter`] from configuration sections.

use std::collections::HashSet;

use dlt_types::service::CALLSW_CINJECTION;
use dlt_types::{FilterLevel, LEVEL_MAX};
use tracing::{debug, warn};

use super::MessageFilter;
use crate::domain::tokens::{
    parse_client_mask, parse_control_mask, parse_injection_list, parse_service_ids,
};
use crate::domain::{FilterSegment, InjectionConfig, InjectionRegistry, SegmentChain};
use crate::error::FilterError;
use crate::ports::{FilterConfigProvider, FilterSection, InjectionSection};

/// Validate a configured level against `[0, LEVEL_MAX]`.
pub fn check_level(level: i64) -> Result<FilterLevel, FilterError> {
    FilterLevel::try_from(level)
        .ok()
        .filter(|l| *l <= LEVEL_MAX)
        .ok_or(FilterError::LevelOutOfRange {
            level,
            max: LEVEL_MAX,
        })
}

fn require_field(section: &str, field: &str, value: &str) -> Result<(), FilterError> {
    if value.trim().is_empty() {
        return Err(FilterError::ConfigInvalid(format!(
            "injection '{section}': {field} must not be empty"
        )));
    }
    Ok(())
}

fn build_injection(section: &InjectionSection) -> Result<InjectionConfig, FilterError> {
    require_field(&section.name, "app_id", &section.app_id)?;
    require_field(&section.name, "context_id", &section.context_id)?;
    require_field(&section.name, "node_id", &section.node_id)?;

    let ids = parse_service_ids(&section.name, &section.service_ids)?;
    if ids.is_empty() {
        return Err(FilterError::ConfigInvalid(format!(
            "injection '{}': no service ids",
            section.name
        )));
    }
    for id in ids.iter().filter(|id| **id < CALLSW_CINJECTION) {
        warn!(
            injection = %section.name,
            service_id = id,
            "Service id is below the injection range"
        );
    }

    Ok(InjectionConfig {
        name: section.name.clone(),
        app_id: section.app_id.trim().to_string(),
        context_id: section.context_id.trim().to_string(),
        node_id: section.node_id.trim().to_string(),
        service_ids: ids.into_iter().collect(),
    })
}

fn build_segment(
    section: &FilterSection,
    registry: &InjectionRegistry,
) -> Result<FilterSegment, FilterError> {
    let level = check_level(section.level)?;
    let client_mask = parse_client_mask(&section.name, &section.clients);
    let ctrl_mask = parse_control_mask(&section.name, &section.control_messages);
    let injections = parse_injection_list(&section.injections);

    if let Some(missing) = injections.names().iter().find(|n| !registry.contains(n)) {
        return Err(FilterError::UnknownInjection {
            filter: section.name.clone(),
            injection: missing.clone(),
        });
    }

    FilterSegment::new(section.name.clone(), level, client_mask, ctrl_mask, injections)
}

impl MessageFilter {
    /// Build a filter from a configuration provider.
    ///
    /// Injections are registered first so that filter whitelists can be
    /// resolved while the chain is built. Any error discards everything
    /// built so far.
    pub fn from_provider<P: FilterConfigProvider + ?Sized>(
        provider: &P,
    ) -> Result<Self, FilterError> {
        let general = provider.general()?;

        let mut registry = InjectionRegistry::new();
        for section in provider.injections()? {
            if registry.contains(&section.name) {
                warn!(injection = %section.name, "Ignoring duplicate injection name");
                continue;
            }
            registry.insert(build_injection(&section)?);
        }

        let mut chain = SegmentChain::new();
        let mut names = HashSet::new();
        for section in provider.filters()? {
            if !names.insert(section.name.clone()) {
                warn!(filter = %section.name, "Ignoring duplicate filter name");
                continue;
            }
            let segment = build_segment(&section, &registry)?;
            debug!(
                filter = %segment.name,
                level = segment.level_max,
                clients = segment.client_mask.bits(),
                "Parsed filter"
            );
            chain.insert(segment)?;
        }
        chain.close();

        let default_level = check_level(general.default_level)?;
        Self::new(general.name, chain, registry, default_level, general.backend)
    }
}
