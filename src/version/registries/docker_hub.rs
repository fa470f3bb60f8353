//! Docker Hub API registry implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{DOCKER_HUB_MAX_PAGES, DOCKER_HUB_PAGE_SIZE};
use crate::image::RepositoryKey;
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

use super::{build_client, check_status};

/// Default base URL for the Docker Hub API
pub const DEFAULT_BASE_URL: &str = "https://hub.docker.com";

/// One page of the Docker Hub tag listing
#[derive(Debug, Deserialize)]
struct TagsPage {
    next: Option<String>,
    #[serde(default)]
    results: Vec<TagResult>,
}

#[derive(Debug, Deserialize)]
struct TagResult {
    name: String,
}

/// Registry implementation for the Docker Hub API
pub struct DockerHubRegistry {
    client: reqwest::Client,
    base_url: String,
    max_pages: usize,
}

impl DockerHubRegistry {
    /// Creates a new DockerHubRegistry with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: DOCKER_HUB_MAX_PAGES,
        })
    }

    /// Limit how many pages are followed for a single repository
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

#[async_trait::async_trait]
impl Registry for DockerHubRegistry {
    fn name(&self) -> &'static str {
        "docker-hub"
    }

    async fn list_tags(&self, repository: &RepositoryKey) -> Result<Vec<String>, RegistryError> {
        let mut url = format!(
            "{}/v2/namespaces/{}/repositories/{}/tags?page_size={}",
            self.base_url, repository.namespace, repository.name, DOCKER_HUB_PAGE_SIZE
        );
        let mut tags = Vec::new();

        for _ in 0..self.max_pages {
            debug!("Fetching Docker Hub tags from {}", url);
            let response = self.client.get(&url).send().await?;
            let response = check_status(response, repository)?;

            let page: TagsPage = response.json().await.map_err(|e| {
                warn!("Failed to parse Docker Hub response: {}", e);
                RegistryError::InvalidResponse(e.to_string())
            })?;

            tags.extend(page.results.into_iter().map(|result| result.name));

            match page.next {
                Some(next) if !next.is_empty() => url = next,
                _ => return Ok(tags),
            }
        }

        debug!(
            "Stopped listing {} after {} pages ({} tags)",
            repository,
            self.max_pages,
            tags.len()
        );
        Ok(tags)
    }
}
