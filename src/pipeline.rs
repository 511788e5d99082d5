//! Pipeline orchestration for the shading lane.
//!
//! One `process` run:
//! - decode the load manifest,
//! - build the relocation rule table,
//! - resolve every dependency into the verified cache,
//! - scan all resolved archives into the global symbol map,
//! - relocate each archive and hand its output path to the consumer.
//!
//! The symbol map is completed before any archive is rewritten; a partial
//! overlap would let a cross-archive reference be rewritten against an
//! incomplete table.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use shade_manifest::{LoadManifest, ManifestError, SecretStore};
use shade_relocate::{relocate, RelocateError, RelocationRules, SymbolMap};

use crate::cache::CacheLayout;
use crate::config::LaneConfig;
use crate::resolver::{ResolveError, Resolver};

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("relocation error: {0}")]
    Relocate(#[from] RelocateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters and outputs from one `process` run.
#[derive(Debug, Default)]
pub struct ProcessReport {
    /// Relocated output paths, in manifest declaration order.
    pub relocated: Vec<PathBuf>,
    /// Relocated outputs reused from a previous run.
    pub reused: usize,
    /// Compiled units rewritten across all archives.
    pub units_rewritten: usize,
    /// Output entries dropped after name collisions.
    pub collisions_dropped: usize,
}

/// The shading lane: a resolver plus relocation over its output.
pub struct Lane {
    config: LaneConfig,
    resolver: Resolver,
}

impl Lane {
    /// Create a lane from configuration, loading its secrets files in
    /// order.
    pub fn create(config: LaneConfig) -> Result<Self, PipelineError> {
        let layout = CacheLayout::new(config.base_dir.clone());
        let mut secrets = SecretStore::new();
        for path in &config.secrets_files {
            secrets.load(path);
        }
        let resolver = Resolver::new(layout, secrets)?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &LaneConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Run the resolution stage only.
    pub fn resolve<R: Read>(&self, manifest: R) -> Result<Vec<PathBuf>, PipelineError> {
        let manifest = LoadManifest::from_reader(manifest)?;
        Ok(self.resolver.resolve(&manifest)?)
    }

    /// Run the full pipeline, invoking `consumer` once per dependency, in
    /// declaration order, with the path to its relocated archive.
    pub fn process<R: Read, F: FnMut(&Path)>(
        &self,
        manifest: R,
        mut consumer: F,
    ) -> Result<ProcessReport, PipelineError> {
        let manifest = LoadManifest::from_reader(manifest)?;

        let mut rules = RelocationRules::new();
        for relocation in &manifest.relocations {
            if !relocation.from.is_empty() {
                rules.add(&relocation.from, &relocation.to);
            }
        }

        let resolved = self.resolver.resolve(&manifest)?;

        // Scan everything before rewriting anything.
        let symbols = SymbolMap::build(&rules, &resolved)?;

        let layout = self.resolver.layout();
        fs::create_dir_all(layout.relocated_dir())?;

        let mut report = ProcessReport::default();
        for source in &resolved {
            let output = layout.relocated_path(source);
            if self.config.reuse_relocated && output.exists() {
                report.reused += 1;
            } else {
                if output.exists() {
                    fs::remove_file(&output)?;
                }
                let summary = relocate(source, &output, &symbols, &rules)?;
                report.units_rewritten += summary.units_rewritten;
                report.collisions_dropped += summary.collisions_dropped;
            }
            consumer(&output);
            report.relocated.push(output);
        }

        if report.collisions_dropped > 0 {
            eprintln!(
                "warning: {} output entr{} dropped after relocation name collisions",
                report.collisions_dropped,
                if report.collisions_dropped == 1 { "y" } else { "ies" }
            );
        }

        Ok(report)
    }

    /// Prefetch a tool artifact, resolving its version through the
    /// configured override chain when none is given.
    pub fn download_tool(
        &self,
        group: &str,
        artifact: &str,
        version: Option<&str>,
    ) -> Result<PathBuf, PipelineError> {
        let version = match version {
            Some(version) => version.to_string(),
            None => self.config.resolved_tool_version(),
        };
        Ok(self.resolver.download_tool(group, artifact, &version)?)
    }
}
