//! Container engine layer
//!
//! - [`ContainerEngine`]: lists the running containers to check
//! - [`docker`]: implementation backed by the local Docker daemon

pub mod docker;

pub use docker::DockerEngine;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

/// A running container as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    pub id: String,
    pub name: String,
    /// Image string exactly as the engine reported it
    pub raw_image: String,
}

impl ContainerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, raw_image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            raw_image: raw_image.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to connect to the container engine: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("Failed to list containers: {0}")]
    Docker(#[from] bollard::errors::Error),
}

/// Source of the containers inspected by a check run
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Lists running containers only
    async fn list_running_containers(&self) -> Result<Vec<ContainerRef>, EngineError>;
}
