//! Shade Manifest Types
//!
//! Defines the load manifest consumed by the shading lane: the declared
//! repositories, the pinned dependency set, and the relocation entries,
//! plus the secret store that resolves `${NAME}` credential placeholders.

pub mod error;
pub mod manifest;
pub mod secrets;

pub use error::ManifestError;
pub use manifest::{Dependency, LoadManifest, Relocation, Repository};
pub use secrets::SecretStore;
