//! Secret store for repository credentials.
//!
//! Merges one or more local key=value files with process environment
//! variables. Repository credentials in the manifest are placeholders
//! (`${NAME}`), resolved here at download time. An unresolved placeholder
//! degrades to an empty string with a stderr warning; the request simply
//! goes out unauthenticated.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Resolved credential values, layered from files and the environment.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    values: HashMap<String, String>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a key=value secrets file into the store.
    ///
    /// Blank lines and lines starting with `#` are ignored; the first `=`
    /// splits key from value and both sides are trimmed. A missing or
    /// unreadable file is silently a no-op. Repeated loads accumulate;
    /// a later file's keys overwrite earlier ones.
    pub fn load(&mut self, path: &Path) {
        let Ok(content) = fs::read_to_string(path) else {
            return;
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.values
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    /// Resolve a raw credential string.
    ///
    /// A value exactly wrapped in `${...}` is looked up first in the loaded
    /// files, then in the process environment. An unresolved name warns on
    /// stderr and resolves to the empty string; resolution never aborts.
    /// Any other string passes through unchanged.
    pub fn resolve(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let Some(name) = raw
            .strip_prefix("${")
            .and_then(|inner| inner.strip_suffix('}'))
        else {
            return raw.to_string();
        };

        if let Some(value) = self.values.get(name) {
            if !value.is_empty() {
                return value.clone();
            }
        }
        if let Ok(value) = env::var(name) {
            if !value.is_empty() {
                return value;
            }
        }

        eprintln!("warning: secret '{name}' not found in secrets file or environment");
        String::new()
    }

    /// Number of keys loaded from files.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
