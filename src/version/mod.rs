//! Version layer for image update checking
//!
//! This module lists repository tags from registries, caches the listings for
//! the duration of a run, and decides per container whether a newer version
//! tag exists.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │◀────│   Checker   │
//! │ (list tags) │     │ (per run)   │     │  (decide)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       │
//!        │                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │  Resolver   │                         │   Semver    │
//! │ (host→reg)  │                         │ (ordering)  │
//! └─────────────┘                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Single-flight tag cache owned by one run
//! - [`checker`]: Update decision and status types
//! - [`registry`]: Registry trait for listing tags
//! - [`registries`]: Docker Hub and OCI distribution implementations
//! - [`resolver`]: Hostname to registry table
//! - [`error`]: Error types for registry lookups
//! - [`semver`]: Tag ordering and candidate filtering

pub mod cache;
pub mod checker;
pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
