//! Registry implementations for listing repository tags

pub mod docker_hub;
pub mod oci;

pub use docker_hub::DockerHubRegistry;
pub use oci::OciRegistry;

use reqwest::StatusCode;
use tracing::warn;

use crate::image::RepositoryKey;
use crate::version::error::RegistryError;

/// User agent sent to every registry
const USER_AGENT: &str = concat!("tagscout/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client() -> Result<reqwest::Client, RegistryError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Map non-success statuses shared by all registries to errors
fn check_status(
    response: reqwest::Response,
    repository: &RepositoryKey,
) -> Result<reqwest::Response, RegistryError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(repository.to_string()));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(RegistryError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(RegistryError::Unauthorized(format!(
            "{} returned {}",
            repository, status
        )));
    }

    if !status.is_success() {
        warn!("Registry returned status {}: {}", status, response.url());
        return Err(RegistryError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}
