//! Lane configuration.
//!
//! Small layered configuration: builtin defaults, an optional
//! `.shade/lane.toml` file, the `SHADE_TOOL_VERSION` environment variable,
//! then explicit overrides from the caller or CLI flags.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the tool artifact version.
pub const TOOL_VERSION_ENV: &str = "SHADE_TOOL_VERSION";

/// Built-in default version of the binary-toolkit artifact.
pub const DEFAULT_TOOL_VERSION: &str = "9.9.1";

/// Default base cache directory.
pub const DEFAULT_BASE_DIR: &str = ".shade";

/// Default lane config file path.
pub const DEFAULT_CONFIG_FILE: &str = ".shade/lane.toml";

/// Errors for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Knobs recognized by the lane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Base cache directory holding downloads, tools and relocated output.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Explicit tool-version override. Takes precedence over the
    /// environment variable and the built-in default.
    #[serde(default)]
    pub tool_version: Option<String>,

    /// Secrets files, layered in order; a later file's keys overwrite an
    /// earlier file's for the same key.
    #[serde(default)]
    pub secrets_files: Vec<PathBuf>,

    /// Reuse existing relocated output instead of rebuilding it. The
    /// relocated namespace is not digest-verified; only the resolution
    /// stage is.
    #[serde(default)]
    pub reuse_relocated: bool,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BASE_DIR)
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            tool_version: None,
            secrets_files: Vec::new(),
            reuse_relocated: false,
        }
    }
}

impl LaneConfig {
    /// Load configuration from a file.
    ///
    /// An explicit path must be readable. With no explicit path, the
    /// default location is used when present and builtin defaults apply
    /// otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) if !required => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Tool version after layering: explicit override, then the
    /// environment, then the built-in default.
    pub fn resolved_tool_version(&self) -> String {
        if let Some(version) = &self.tool_version {
            if !version.trim().is_empty() {
                return version.trim().to_string();
            }
        }
        if let Ok(version) = env::var(TOOL_VERSION_ENV) {
            if !version.trim().is_empty() {
                return version.trim().to_string();
            }
        }
        DEFAULT_TOOL_VERSION.to_string()
    }
}
