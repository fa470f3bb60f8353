use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Outcome of a failed tag lookup, shared by every container of the repository
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error(transparent)]
    Registry(Arc<RegistryError>),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cancelled")]
    Cancelled,
}

impl From<RegistryError> for FetchError {
    fn from(err: RegistryError) -> Self {
        FetchError::Registry(Arc::new(err))
    }
}
