//! One check pass over a set of containers

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CheckerConfig;
use crate::container::{ContainerEngine, ContainerRef, EngineError};
use crate::image::ImageReference;
use crate::version::cache::TagRepository;
use crate::version::checker::{UpdateStatus, resolve};
use crate::version::resolver::RegistryTable;

/// Drives check runs against a fixed registry table
pub struct Checker {
    registries: Arc<RegistryTable>,
    concurrency: usize,
    fetch_timeout: Duration,
}

impl Checker {
    pub fn new(registries: Arc<RegistryTable>, config: &CheckerConfig) -> Self {
        Self {
            registries,
            concurrency: config.concurrency.max(1),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// List running containers from the engine and check each of them
    ///
    /// Fails only when the engine cannot list containers.
    pub async fn check(
        &self,
        engine: &dyn ContainerEngine,
        cancel: &CancellationToken,
    ) -> Result<Vec<UpdateStatus>, EngineError> {
        let containers = engine
            .list_running_containers()
            .await
            .inspect_err(|e| error!("Failed to list running containers: {}", e))?;
        info!("Checking {} running containers", containers.len());

        Ok(self.run(containers, cancel).await)
    }

    /// Check every container and return one status per container in input order
    ///
    /// Tag listings are shared by all containers of this run only.
    pub async fn run(
        &self,
        containers: Vec<ContainerRef>,
        cancel: &CancellationToken,
    ) -> Vec<UpdateStatus> {
        let tags = TagRepository::new(self.fetch_timeout, cancel.clone());
        let tags = &tags;
        let registries = self.registries.as_ref();

        let mut statuses: Vec<(usize, UpdateStatus)> =
            stream::iter(containers.into_iter().enumerate())
                .map(move |(index, container)| async move {
                    (index, check_container(&container, registries, tags).await)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        statuses.sort_by_key(|(index, _)| *index);
        info!(
            "Checked {} containers with {} registry lookups",
            statuses.len(),
            tags.fetch_count()
        );

        statuses.into_iter().map(|(_, status)| status).collect()
    }
}

async fn check_container(
    container: &ContainerRef,
    registries: &RegistryTable,
    tags: &TagRepository,
) -> UpdateStatus {
    debug!("Checking container {} ({})", container.name, container.raw_image);

    match ImageReference::parse(&container.raw_image) {
        Ok(image) => resolve(container, image, registries, tags).await,
        Err(e) => {
            warn!(
                "Container {} has an invalid image reference: {}",
                container.name, e
            );
            UpdateStatus::invalid_reference(container, &e)
        }
    }
}
