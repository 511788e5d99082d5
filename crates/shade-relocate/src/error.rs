//! Relocation errors.

use std::io;
use std::path::PathBuf;

/// Errors for symbol scanning and archive rewriting.
#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot open archive {path}: {source}")]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed compiled unit '{entry}': {reason}")]
    MalformedUnit { entry: String, reason: String },
}
