//! Image reference layer
//! - reference.rs: ImageReference, RepositoryKey and the reference parser

pub mod reference;

pub use reference::{DEFAULT_NAMESPACE, DEFAULT_REGISTRY, DEFAULT_TAG, DOCKER_HUB_ALIASES};
pub use reference::{ImageReference, ReferenceError, RepositoryKey};
