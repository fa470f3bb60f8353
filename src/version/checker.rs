//! Update decision for a single container

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::container::ContainerRef;
use crate::image::{DEFAULT_TAG, ImageReference, ReferenceError};
use crate::version::cache::TagRepository;
use crate::version::resolver::RegistryTable;
use crate::version::semver::{find_newest, is_well_formed};

/// Why a container was not checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Tag is `latest` or not a version
    UntrackedTag,
    /// No registry client for the image's registry host
    UnsupportedRegistry,
}

/// Why a container could not be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    InvalidReference,
    FetchError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    NoUpdate,
    UpdateAvailable,
}

/// Outcome of checking one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum UpdateState {
    Skipped(SkipReason),
    Failed(FailureKind),
    Resolved(Resolution),
}

impl UpdateState {
    /// Short label for tables and logs
    pub fn label(&self) -> &'static str {
        match self {
            UpdateState::Skipped(SkipReason::UntrackedTag) => "skipped (untracked tag)",
            UpdateState::Skipped(SkipReason::UnsupportedRegistry) => "skipped (unsupported registry)",
            UpdateState::Failed(FailureKind::InvalidReference) => "failed (invalid reference)",
            UpdateState::Failed(FailureKind::FetchError) => "failed (fetch error)",
            UpdateState::Resolved(Resolution::NoUpdate) => "up to date",
            UpdateState::Resolved(Resolution::UpdateAvailable) => "update available",
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of checking one container in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub container_id: String,
    pub container_name: String,
    /// Absent only when the image reference could not be parsed
    pub image: Option<ImageReference>,
    pub raw_image: String,
    pub original_tag: String,
    pub latest_available_tag: Option<String>,
    pub update_available: bool,
    pub state: UpdateState,
    pub error: Option<String>,
}

impl UpdateStatus {
    fn new(container: &ContainerRef, image: ImageReference, state: UpdateState) -> Self {
        Self {
            container_id: container.id.clone(),
            container_name: container.name.clone(),
            raw_image: container.raw_image.clone(),
            original_tag: image.tag().to_string(),
            image: Some(image),
            latest_available_tag: None,
            update_available: false,
            state,
            error: None,
        }
    }

    /// Status for a container whose image string could not be parsed
    pub fn invalid_reference(container: &ContainerRef, err: &ReferenceError) -> Self {
        Self {
            container_id: container.id.clone(),
            container_name: container.name.clone(),
            image: None,
            raw_image: container.raw_image.clone(),
            original_tag: String::new(),
            latest_available_tag: None,
            update_available: false,
            state: UpdateState::Failed(FailureKind::InvalidReference),
            error: Some(err.to_string()),
        }
    }
}

/// Decide whether a newer version of the container's image exists
pub async fn resolve(
    container: &ContainerRef,
    image: ImageReference,
    registries: &RegistryTable,
    tags: &TagRepository,
) -> UpdateStatus {
    if image.tag() == DEFAULT_TAG || !is_well_formed(image.tag()) {
        debug!(
            "Container {} runs untracked tag {}",
            container.name,
            image.tag()
        );
        return UpdateStatus::new(container, image, UpdateState::Skipped(SkipReason::UntrackedTag));
    }

    let Some(registry) = registries.get(image.registry()) else {
        debug!(
            "No registry client for {} (container {})",
            image.registry(),
            container.name
        );
        return UpdateStatus::new(
            container,
            image,
            UpdateState::Skipped(SkipReason::UnsupportedRegistry),
        );
    };

    let available = match tags.get_tags(&image.repository_key(), registry.as_ref()).await {
        Ok(available) => available,
        Err(e) => {
            warn!("Cannot check container {}: {}", container.name, e);
            let mut status =
                UpdateStatus::new(container, image, UpdateState::Failed(FailureKind::FetchError));
            status.error = Some(e.to_string());
            return status;
        }
    };

    match find_newest(image.tag(), &available) {
        Some(latest) => {
            debug!(
                "Container {} can move from {} to {}",
                container.name,
                image.tag(),
                latest
            );
            let mut status = UpdateStatus::new(
                container,
                image,
                UpdateState::Resolved(Resolution::UpdateAvailable),
            );
            status.latest_available_tag = Some(latest);
            status.update_available = true;
            status
        }
        None => UpdateStatus::new(container, image, UpdateState::Resolved(Resolution::NoUpdate)),
    }
}
