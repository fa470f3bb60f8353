//! Registry dispatch by hostname
//!
//! Maps the registry host of an image reference to the client able to list
//! its tags. The table is built once at startup and never changes afterwards.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::config::RegistriesConfig;
use crate::image::DEFAULT_REGISTRY;
use crate::version::error::RegistryError;
use crate::version::registries::docker_hub::{DEFAULT_BASE_URL, DockerHubRegistry};
use crate::version::registries::oci::OciRegistry;
use crate::version::registry::Registry;

/// Immutable mapping from registry hostname to registry client
#[derive(Clone, Default)]
pub struct RegistryTable {
    registries: IndexMap<String, Arc<dyn Registry>>,
}

impl RegistryTable {
    /// Build a table from (hostname, registry) pairs; later duplicates win
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn Registry>)>,
    {
        Self {
            registries: entries.into_iter().collect(),
        }
    }

    /// Get the registry client for a hostname
    pub fn get(&self, host: &str) -> Option<&Arc<dyn Registry>> {
        self.registries.get(host)
    }

    /// Hostnames in the order they were configured
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.registries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

/// Create the registry table for the configured registries
pub fn create_default_registries(config: &RegistriesConfig) -> Result<RegistryTable, RegistryError> {
    let mut entries: Vec<(String, Arc<dyn Registry>)> = Vec::new();

    if config.docker_hub.enabled {
        // Parsing folds Docker Hub aliases into DEFAULT_REGISTRY
        entries.push((
            DEFAULT_REGISTRY.to_string(),
            Arc::new(DockerHubRegistry::new(DEFAULT_BASE_URL)?),
        ));
    }

    for oci in &config.oci {
        entries.push((
            oci.host.clone(),
            Arc::new(OciRegistry::for_host(&oci.host, oci.insecure)?),
        ));
    }

    let table = RegistryTable::from_entries(entries);
    info!(
        "Registry clients configured for: {}",
        table.hosts().collect::<Vec<_>>().join(", ")
    );

    Ok(table)
}
