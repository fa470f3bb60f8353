//! Registry trait for listing the tags of an image repository

#[cfg(test)]
use mockall::automock;

use crate::image::RepositoryKey;
use crate::version::error::RegistryError;

/// Trait for listing tags from a container registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Short name of this implementation, used in logs
    fn name(&self) -> &'static str;

    /// Lists all tags of a repository
    ///
    /// # Arguments
    /// * `repository` - The repository to list (e.g., docker.io/library/nginx)
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Tags in the order the registry returned them
    /// * `Err(RegistryError)` - If the listing fails
    async fn list_tags(&self, repository: &RepositoryKey) -> Result<Vec<String>, RegistryError>;
}
