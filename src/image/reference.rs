//! Container image reference parsing
//!
//! Decomposes references such as `nginx`, `library/nginx:1.25` or
//! `myregistry.com:8080/org/proj/name:1.25` into registry, namespace, name
//! and tag, applying the Docker Hub defaults for missing parts.

use std::fmt;

use serde::Serialize;

/// Registry used when the reference does not name one
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Other hostnames that serve Docker Hub repositories
pub const DOCKER_HUB_ALIASES: &[&str] = &["index.docker.io", "registry-1.docker.io"];

/// Namespace used for single-segment Docker Hub references
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag used when the reference does not carry one
pub const DEFAULT_TAG: &str = "latest";

/// Error type for image reference parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("image reference is empty")]
    Empty,

    #[error("image reference contains an empty path segment: {0}")]
    EmptySegment(String),

    #[error("image name is missing: {0}")]
    MissingName(String),

    #[error("tag is empty: {0}")]
    MissingTag(String),

    #[error("image ID has no repository: {0}")]
    ImageId(String),

    #[error("invalid image format: {0}")]
    InvalidFormat(String),
}

/// Identifies an image repository independently of its tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryKey {
    pub registry: String,
    pub namespace: String,
    pub name: String,
    /// Namespace was defaulted on a registry other than Docker Hub
    implicit_namespace: bool,
}

impl RepositoryKey {
    pub fn new(registry: &str, namespace: &str, name: &str) -> Self {
        Self {
            registry: registry.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            implicit_namespace: false,
        }
    }

    /// Repository path inside the registry (e.g. "library/nginx")
    ///
    /// Outside Docker Hub a defaulted namespace is not part of the path.
    pub fn path(&self) -> String {
        if self.implicit_namespace {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.registry, self.namespace, self.name)
    }
}

/// A parsed container image reference
///
/// Fields are private so that a reference cannot change after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    raw: String,
    registry: String,
    namespace: String,
    name: String,
    tag: String,
    #[serde(skip)]
    implicit_namespace: bool,
}

impl ImageReference {
    /// Parse a raw image string as reported by the container engine
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        if raw.is_empty() {
            return Err(ReferenceError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ReferenceError::InvalidFormat(raw.to_string()));
        }
        if is_image_id(raw) {
            return Err(ReferenceError::ImageId(raw.to_string()));
        }

        let segments: Vec<&str> = raw.split('/').collect();
        let (registry, path) = match segments.split_first() {
            Some((first, rest)) if !rest.is_empty() && is_registry_host(first) => (*first, rest),
            _ => (DEFAULT_REGISTRY, segments.as_slice()),
        };
        let registry = canonical_registry(registry);

        if path.iter().any(|segment| segment.is_empty()) {
            return Err(ReferenceError::EmptySegment(raw.to_string()));
        }

        let Some((last, parents)) = path.split_last() else {
            return Err(ReferenceError::MissingName(raw.to_string()));
        };

        // A digest pins content, not a version; only the tag matters here
        let last = last.split_once('@').map_or(*last, |(name, _)| name);

        // Only the last segment may carry a tag, so a registry port is never a tag
        let (name, tag) = last.split_once(':').unwrap_or((last, DEFAULT_TAG));

        if name.is_empty() {
            return Err(ReferenceError::MissingName(raw.to_string()));
        }
        if tag.is_empty() {
            return Err(ReferenceError::MissingTag(raw.to_string()));
        }
        if tag.contains(':') {
            return Err(ReferenceError::InvalidFormat(raw.to_string()));
        }

        let namespace = if parents.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            parents.join("/")
        };

        Ok(Self {
            raw: raw.to_string(),
            registry: registry.to_string(),
            namespace,
            name: name.to_string(),
            tag: tag.to_string(),
            implicit_namespace: parents.is_empty(),
        })
    }

    /// The unparsed reference, kept for diagnostics
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Key shared by every reference to the same repository, whatever the tag
    pub fn repository_key(&self) -> RepositoryKey {
        RepositoryKey {
            implicit_namespace: self.implicit_namespace && self.registry != DEFAULT_REGISTRY,
            ..RepositoryKey::new(&self.registry, &self.namespace, &self.name)
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}",
            self.registry, self.namespace, self.name, self.tag
        )
    }
}

/// A first segment names a registry only when it looks like a host
fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// Docker Hub is reachable under several hostnames; key them all as one
fn canonical_registry(host: &str) -> &str {
    if DOCKER_HUB_ALIASES.contains(&host) {
        DEFAULT_REGISTRY
    } else {
        host
    }
}

/// Engines report `sha256:<hex>` when a container's image has lost its tag
fn is_image_id(raw: &str) -> bool {
    raw.strip_prefix("sha256:")
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
