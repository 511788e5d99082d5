//! Load manifest schema.
//!
//! The manifest is produced by a build-time collaborator and consumed here.
//! Three named lists: `repositories`, `dependencies`, `relocations`. All
//! string fields; absent fields decode as empty strings so a malformed
//! fragment surfaces later as a resolution failure rather than a parse
//! failure. Credentials hold `${VAR}` placeholders, never raw secrets.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// One artifact source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    /// Base URL of the repository.
    #[serde(default)]
    pub url: String,
    /// Username placeholder (may contain `${VAR}` syntax).
    #[serde(default)]
    pub user: String,
    /// Password placeholder (may contain `${VAR}` syntax).
    #[serde(default)]
    pub pass: String,
}

/// One pinned external artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub version: String,
    /// Expected SHA-256 digest, hex-encoded. Empty means no verification.
    #[serde(default)]
    pub checksum: String,
}

/// One prefix rewrite declaration, in dotted or slash notation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relocation {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// The full declarative input to one lane run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadManifest {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub relocations: Vec<Relocation>,
}

impl Dependency {
    /// Whether a digest was declared for this dependency.
    pub fn has_checksum(&self) -> bool {
        !self.checksum.is_empty()
    }

    /// `artifact-version.jar`, the standard repository file name.
    pub fn file_name(&self) -> String {
        format!("{}-{}.jar", self.artifact, self.version)
    }

    /// Group with dots replaced by slashes, as laid out on disk and in URLs.
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }
}

impl LoadManifest {
    /// Decode a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a manifest from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ManifestError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
