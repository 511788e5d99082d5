//! Artifact cache layout and digest-gated reuse.
//!
//! All lane state lives under one base directory in three namespaces:
//! - `downloads/<group-path>/<artifact>-<version>.jar`: verified
//!   dependency downloads,
//! - `tools/<artifact>-<version>.jar`: prefetched tool artifacts,
//! - `relocated/relocated-<name>`: rewritten output bundles.
//!
//! A cached download is trusted only while it exists and still matches its
//! declared digest; a mismatch evicts the file so the resolver re-downloads
//! it in full. Partial patching is never attempted.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use shade_manifest::Dependency;

/// Namespace directory for resolved dependency downloads.
pub const DOWNLOADS_DIR: &str = "downloads";

/// Namespace directory for prefetched tool artifacts.
pub const TOOLS_DIR: &str = "tools";

/// Namespace directory for relocated output bundles.
pub const RELOCATED_DIR: &str = "relocated";

/// Deterministic mapping from artifact coordinates to cache paths.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    base: PathBuf,
}

impl CacheLayout {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Canonical cache path for a declared dependency.
    pub fn download_path(&self, dependency: &Dependency) -> PathBuf {
        self.base
            .join(DOWNLOADS_DIR)
            .join(dependency.group_path())
            .join(dependency.file_name())
    }

    /// Cache path for a tool artifact, keyed by artifact and version only.
    pub fn tool_path(&self, artifact: &str, version: &str) -> PathBuf {
        self.base.join(TOOLS_DIR).join(format!("{artifact}-{version}.jar"))
    }

    /// Directory holding relocated output bundles.
    pub fn relocated_dir(&self) -> PathBuf {
        self.base.join(RELOCATED_DIR)
    }

    /// Output path for the relocated form of a source bundle.
    pub fn relocated_path(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.relocated_dir().join(format!("relocated-{name}"))
    }

    /// Count files and bytes in each cache namespace.
    pub fn stats(&self) -> io::Result<CacheStats> {
        Ok(CacheStats {
            downloads: namespace_stats(&self.base.join(DOWNLOADS_DIR))?,
            tools: namespace_stats(&self.base.join(TOOLS_DIR))?,
            relocated: namespace_stats(&self.base.join(RELOCATED_DIR))?,
        })
    }

    /// Remove all relocated output so the next run rebuilds it. Downloads
    /// and tools are kept; they are digest-verified and safe to reuse.
    pub fn clear_relocated(&self) -> io::Result<()> {
        let dir = self.relocated_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Per-namespace file count and byte total.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NamespaceStats {
    pub files: usize,
    pub bytes: u64,
}

/// Cache usage across the three namespaces.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub downloads: NamespaceStats,
    pub tools: NamespaceStats,
    pub relocated: NamespaceStats,
}

fn namespace_stats(dir: &Path) -> io::Result<NamespaceStats> {
    let mut stats = NamespaceStats::default();
    if !dir.exists() {
        return Ok(stats);
    }
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() {
            stats.files += 1;
            stats.bytes += entry.metadata().map_err(io::Error::other)?.len();
        }
    }
    Ok(stats)
}

/// Hex-encoded SHA-256 of a file's full contents.
pub fn file_sha256_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a file's digest against a declared hex digest, case-insensitively.
pub fn digest_matches(path: &Path, expected: &str) -> io::Result<bool> {
    let actual = file_sha256_hex(path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

/// Decide whether a cached file can be reused for the given declared
/// digest. A file that exists with no declared digest, or whose digest
/// matches, is reusable; a mismatch evicts the file and reports a miss.
pub fn reuse_or_evict(path: &Path, checksum: &str) -> io::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    if checksum.is_empty() || digest_matches(path, checksum)? {
        return Ok(true);
    }
    fs::remove_file(path)?;
    Ok(false)
}
