//! Registry and engine test utilities

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tagscout::container::{ContainerEngine, ContainerRef, EngineError};
use tagscout::image::RepositoryKey;
use tagscout::version::error::RegistryError;
use tagscout::version::registry::Registry;
use tagscout::version::resolver::RegistryTable;

/// In-memory registry that counts how often each repository is listed
#[derive(Default)]
pub struct CountingRegistry {
    tags: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tags of a repository given as "namespace/name"
    pub fn with_tags(mut self, path: &str, tags: Vec<&str>) -> Self {
        self.tags.insert(
            path.to_string(),
            tags.into_iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Make listings of "namespace/name" fail
    pub fn with_failure(mut self, path: &str) -> Self {
        self.failing.push(path.to_string());
        self
    }

    pub fn calls_for(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for CountingRegistry {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn list_tags(&self, repository: &RepositoryKey) -> Result<Vec<String>, RegistryError> {
        let path = repository.path();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(path.clone()).or_default() += 1;

        // Give concurrent callers a chance to pile up on the same key
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        if self.failing.contains(&path) {
            return Err(RegistryError::InvalidResponse(format!(
                "listing {} failed",
                path
            )));
        }
        self.tags
            .get(&path)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(repository.to_string()))
    }
}

/// Registry table serving docker.io from the given registry
pub fn docker_hub_table(registry: Arc<CountingRegistry>) -> RegistryTable {
    RegistryTable::from_entries([("docker.io".to_string(), registry as Arc<dyn Registry>)])
}

/// Engine returning a fixed container list
pub struct StaticEngine {
    containers: Vec<ContainerRef>,
}

impl StaticEngine {
    pub fn new(images: &[(&str, &str)]) -> Self {
        Self {
            containers: images
                .iter()
                .enumerate()
                .map(|(i, (name, image))| ContainerRef::new(format!("id-{}", i), *name, *image))
                .collect(),
        }
    }
}

#[async_trait]
impl ContainerEngine for StaticEngine {
    async fn list_running_containers(&self) -> Result<Vec<ContainerRef>, EngineError> {
        Ok(self.containers.clone())
    }
}
