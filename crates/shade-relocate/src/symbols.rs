//! Global symbol map.
//!
//! One up-front scan over every resolved archive derives the internal
//! fully-qualified name of each compiled unit from its entry path and
//! consults the rule table. Only names that actually change are recorded.
//! The resulting map is an immutable snapshot consumed read-only during
//! rewriting, so a symbol defined in one archive and referenced from
//! another renames identically regardless of processing order.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::RelocateError;
use crate::rules::RelocationRules;

/// Archive entry suffix marking a compiled unit.
pub(crate) const UNIT_SUFFIX: &str = ".class";

/// Entry-path prefix for version-scoped compiled units.
pub(crate) const VERSION_SCOPE_PREFIX: &str = "META-INF/versions/";

/// Full-name substitution table from old internal name to new.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    pub(crate) map: HashMap<String, String>,
}

impl SymbolMap {
    /// Scan the given archives and build a fresh mapping for every
    /// compiled-unit name the rule table changes.
    pub fn build(rules: &RelocationRules, archives: &[impl AsRef<Path>]) -> Result<Self, RelocateError> {
        let mut map = HashMap::new();

        for path in archives {
            let path = path.as_ref();
            let file = File::open(path).map_err(|source| RelocateError::OpenArchive {
                path: path.to_path_buf(),
                source,
            })?;
            let mut archive = tar::Archive::new(BufReader::new(file));

            for entry in archive.entries()? {
                let entry = entry?;
                if entry.header().entry_type().is_dir() {
                    continue;
                }
                let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
                let Some(internal) = name.strip_suffix(UNIT_SUFFIX) else {
                    continue;
                };

                let (_, unscoped) = split_version_scope(internal);
                let mapped = rules.map_path(unscoped);
                if mapped != unscoped {
                    map.insert(unscoped.to_string(), mapped);
                }
            }
        }

        Ok(Self { map })
    }

    /// Look up the new name for an old internal name.
    pub fn get(&self, old: &str) -> Option<&str> {
        self.map.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Split a version-scope segment (`META-INF/versions/<n>/`) off an entry
/// name. Returns the scope prefix (possibly empty) and the remainder.
pub(crate) fn split_version_scope(name: &str) -> (&str, &str) {
    if let Some(rest) = name.strip_prefix(VERSION_SCOPE_PREFIX) {
        if let Some(slash) = rest.find('/') {
            let cut = VERSION_SCOPE_PREFIX.len() + slash + 1;
            return (&name[..cut], &name[cut..]);
        }
    }
    ("", name)
}
