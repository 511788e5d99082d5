//! Manifest decode errors.

use std::io;

/// Errors for manifest loading and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("manifest decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
