//! Resolution engine.
//!
//! Turns the declared dependency list into verified, locally cached files.
//! Each dependency is checked against the cache first; on a miss the
//! declared repositories are tried in order until one yields a verified
//! download. Every attempt lands in a fresh temp file next to the target
//! and only reaches the canonical cache path by atomic rename after the
//! status and digest checks pass. A crash or failed check never leaves a
//! corrupt file at the canonical path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use shade_manifest::{Dependency, LoadManifest, Repository, SecretStore};

use crate::cache::{self, CacheLayout};

/// The single well-known public repository used for tool artifacts.
pub const TOOL_REPOSITORY: &str = "https://repo1.maven.org/maven2";

/// Errors for dependency resolution and tool prefetch.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not resolve {artifact} from any repository")]
    Unresolvable { artifact: String },

    #[error("failed to download tool {artifact}")]
    ToolDownload { artifact: String },
}

/// Blocking resolver over a cache layout and a secret store.
pub struct Resolver {
    layout: CacheLayout,
    secrets: SecretStore,
    client: reqwest::blocking::Client,
}

impl Resolver {
    pub fn new(layout: CacheLayout, secrets: SecretStore) -> Result<Self, ResolveError> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            layout,
            secrets,
            client,
        })
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Resolve every declared dependency, in declaration order.
    ///
    /// A dependency whose cached file exists and still matches its declared
    /// digest is reused without touching the network. Anything else is
    /// downloaded with in-order fallback across the declared repositories;
    /// exhausting them all aborts the whole run; relocation needs the full
    /// dependency set, so a partial result is never acceptable.
    pub fn resolve(&self, manifest: &LoadManifest) -> Result<Vec<PathBuf>, ResolveError> {
        let mut resolved = Vec::with_capacity(manifest.dependencies.len());

        for dependency in &manifest.dependencies {
            let target = self.layout.download_path(dependency);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            if !cache::reuse_or_evict(&target, &dependency.checksum)? {
                let fetched = self.try_repositories(&manifest.repositories, dependency, &target)?;
                if !fetched {
                    return Err(ResolveError::Unresolvable {
                        artifact: dependency.artifact.clone(),
                    });
                }
            }
            resolved.push(target);
        }

        Ok(resolved)
    }

    /// Fetch a pinned tool artifact from the well-known public repository
    /// into the `tools/` namespace: no fallback, no credentials, no digest.
    pub fn download_tool(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<PathBuf, ResolveError> {
        let target = self.layout.tool_path(artifact, version);
        if target.exists() {
            return Ok(target);
        }
        let parent = target.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;

        let url = format!(
            "{TOOL_REPOSITORY}/{}/{artifact}/{version}/{artifact}-{version}.jar",
            group.replace('.', "/"),
        );

        let mut response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(ResolveError::ToolDownload {
                artifact: artifact.to_string(),
            });
        }

        let mut temp = NamedTempFile::new_in(parent)?;
        response.copy_to(temp.as_file_mut())?;
        temp.persist(&target).map_err(|e| ResolveError::Io(e.error))?;
        Ok(target)
    }

    fn try_repositories(
        &self,
        repositories: &[Repository],
        dependency: &Dependency,
        target: &Path,
    ) -> Result<bool, ResolveError> {
        for repository in repositories {
            if self.download(repository, dependency, target)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// One download attempt. `Ok(false)` means this repository did not
    /// yield a verified artifact and the next one should be tried.
    fn download(
        &self,
        repository: &Repository,
        dependency: &Dependency,
        target: &Path,
    ) -> Result<bool, ResolveError> {
        let base = repository.url.trim_end_matches('/');
        let url = format!(
            "{base}/{}/{}/{}/{}",
            dependency.group_path(),
            dependency.artifact,
            dependency.version,
            dependency.file_name(),
        );

        let mut request = self.client.get(&url);
        let user = self.secrets.resolve(&repository.user);
        if !user.is_empty() {
            let pass = self.secrets.resolve(&repository.pass);
            request = request.basic_auth(user, Some(pass));
        }

        let mut response = match request.send() {
            Ok(response) => response,
            Err(err) => {
                eprintln!("warning: {url}: {err}");
                return Ok(false);
            }
        };
        if !response.status().is_success() {
            return Ok(false);
        }

        let parent = target.parent().unwrap_or(Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)?;
        if response.copy_to(temp.as_file_mut()).is_err() {
            return Ok(false);
        }

        if dependency.has_checksum() && !cache::digest_matches(temp.path(), &dependency.checksum)? {
            return Ok(false);
        }

        temp.persist(target).map_err(|e| ResolveError::Io(e.error))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(base: &Path) -> Resolver {
        Resolver::new(CacheLayout::new(base.to_path_buf()), SecretStore::new()).unwrap()
    }

    fn manifest_with(dependency: Dependency) -> LoadManifest {
        LoadManifest {
            repositories: Vec::new(),
            dependencies: vec![dependency],
            relocations: Vec::new(),
        }
    }

    #[test]
    fn test_warm_cache_resolves_without_repositories() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(dir.path());

        let dependency = Dependency {
            group: "com.example".to_string(),
            artifact: "widget".to_string(),
            version: "1.0".to_string(),
            checksum: String::new(),
        };
        let cached = resolver.layout().download_path(&dependency);
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"payload").unwrap();

        let resolved = resolver.resolve(&manifest_with(dependency)).unwrap();
        assert_eq!(resolved, vec![cached]);
    }

    #[test]
    fn test_digest_mismatch_with_no_repositories_is_fatal() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(dir.path());

        let dependency = Dependency {
            group: "com.example".to_string(),
            artifact: "widget".to_string(),
            version: "1.0".to_string(),
            checksum: "0".repeat(64),
        };
        let cached = resolver.layout().download_path(&dependency);
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"tampered").unwrap();

        let result = resolver.resolve(&manifest_with(dependency));
        assert!(matches!(result, Err(ResolveError::Unresolvable { artifact }) if artifact == "widget"));
        // The tampered file must be gone, not silently kept.
        assert!(!cached.exists());
    }

    #[test]
    fn test_cached_tool_is_returned_without_network() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(dir.path());

        let cached = resolver.layout().tool_path("asm", "9.9.1");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"tool payload").unwrap();

        let path = resolver.download_tool("org.ow2.asm", "asm", "9.9.1").unwrap();
        assert_eq!(path, cached);
    }
}
