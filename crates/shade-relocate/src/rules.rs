//! Relocation rule table.
//!
//! An ordered set of (source-prefix → target-prefix) mappings. Both sides
//! are normalized to slash-delimited, trailing-slash-terminated prefixes.
//! Lookups consult the rules in descending prefix-length order so the most
//! specific mapping always wins over a more general one. Equal-length
//! prefixes fall back to lexicographic order, which is deterministic across
//! runs but carries no semantic meaning.

use std::collections::BTreeMap;

/// Ordered prefix-rewrite table for paths and dotted names.
#[derive(Debug, Clone, Default)]
pub struct RelocationRules {
    mappings: BTreeMap<String, String>,
    /// Mappings sorted by descending key length, rebuilt on every insert.
    ordered: Vec<(String, String)>,
}

impl RelocationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping in dotted or slash notation; both sides are normalized
    /// to slash-delimited prefixes with a trailing slash. Re-adding a source
    /// prefix overwrites its target.
    pub fn add(&mut self, from: &str, to: &str) {
        let mut from = from.replace('.', "/");
        let mut to = to.replace('.', "/");
        if !from.ends_with('/') {
            from.push('/');
        }
        if !to.ends_with('/') {
            to.push('/');
        }

        self.mappings.insert(from, to);
        self.rebuild_ordered();
    }

    fn rebuild_ordered(&mut self) {
        self.ordered = self
            .mappings
            .iter()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();
        self.ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Rewrite a slash-delimited name through the first (longest) matching
    /// prefix, preserving the suffix. No match returns the input unchanged.
    pub fn map_path(&self, name: &str) -> String {
        for (from, to) in &self.ordered {
            if let Some(suffix) = name.strip_prefix(from.as_str()) {
                return format!("{to}{suffix}");
            }
        }
        name.to_string()
    }

    /// Rewrite a dotted name (`com.example.Service`) through the first
    /// matching prefix in its dotted form.
    pub fn map_dotted(&self, name: &str) -> String {
        for (from, to) in &self.ordered {
            let from = from.replace('/', ".");
            if let Some(suffix) = name.strip_prefix(from.as_str()) {
                return format!("{}{}", to.replace('/', "."), suffix);
            }
        }
        name.to_string()
    }

    /// Substitute every mapped prefix, in order, through free-form text.
    /// Used for service-descriptor bodies, which embed dotted names.
    pub fn substitute_dotted(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (from, to) in &self.ordered {
            let from = from.replace('/', ".");
            let to = to.replace('/', ".");
            out = out.replace(&from, &to);
        }
        out
    }

    /// Iterate the mappings in descending prefix-length order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ordered.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
