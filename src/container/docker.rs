//! Docker engine adapter

use bollard::Docker;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerSummary;
use tracing::{debug, warn};

use super::{ContainerEngine, ContainerRef, EngineError};

/// Lists containers through the Docker API socket
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using DOCKER_HOST or the platform's default socket
    pub fn connect() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults().map_err(EngineError::Connect)?;
        Ok(Self { docker })
    }
}

#[async_trait::async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_running_containers(&self) -> Result<Vec<ContainerRef>, EngineError> {
        let options = Some(ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        });

        let summaries = self.docker.list_containers(options).await?;
        debug!("Docker reported {} running containers", summaries.len());

        Ok(summaries
            .into_iter()
            .filter_map(container_from_summary)
            .collect())
    }
}

/// Convert a Docker container summary, skipping entries without an ID
///
/// A missing image is kept as an empty string so the container still gets a status.
fn container_from_summary(summary: ContainerSummary) -> Option<ContainerRef> {
    let Some(id) = summary.id else {
        warn!("Skipping container without ID");
        return None;
    };
    let raw_image = summary.image.unwrap_or_else(|| {
        warn!("Container {} reported without image", id);
        String::new()
    });

    // Docker prefixes names with "/"
    let name = summary
        .names
        .unwrap_or_default()
        .first()
        .map(|name| name.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.chars().take(12).collect());

    Some(ContainerRef { id, name, raw_image })
}
