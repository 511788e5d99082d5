//! Shade Lane - runtime dependency shading
//!
//! This crate implements the shading lane: it resolves a pinned set of
//! binary artifacts from remote repositories, verifies each download by
//! SHA-256 digest, caches the results locally, and rewrites the internal
//! symbolic names inside every archive so multiple copies of a library can
//! coexist in one host process.

pub mod cache;
pub mod config;
pub mod pipeline;
pub mod resolver;

pub use cache::{CacheLayout, CacheStats};
pub use config::{ConfigError, LaneConfig};
pub use pipeline::{Lane, PipelineError, ProcessReport};
pub use resolver::{ResolveError, Resolver};

pub use shade_manifest::{Dependency, LoadManifest, Relocation, Repository, SecretStore};
pub use shade_relocate::{RelocationRules, RelocationSummary, SymbolMap};
