//! Archive relocator.
//!
//! Streams every entry of an input bundle into a freshly written output
//! bundle. Directory entries, the signing manifest, and signature files are
//! dropped (a relocated bundle cannot keep a signature that no longer
//! matches its rewritten content) and a minimal manifest spanning multiple
//! format-version scopes is emitted in their place. Compiled units are
//! rewritten through the global symbol map, service descriptors through the
//! dotted prefix table, and all remaining paths through the plain prefix
//! table. Name collisions after remapping keep the first write and count
//! the rest.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::RelocateError;
use crate::rules::RelocationRules;
use crate::symbols::{split_version_scope, SymbolMap, UNIT_SUFFIX};
use crate::unit::rewrite_unit;

/// The signing manifest entry, replaced on output.
const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Signature entries, matched case-insensitively and dropped.
const SIGNATURE_PREFIX: &str = "META-INF/SIG-";

/// Service-descriptor entries: plain text naming implementations.
const SERVICES_PREFIX: &str = "META-INF/services/";

/// The fresh minimal manifest written into every relocated bundle.
const OUTPUT_MANIFEST: &[u8] = b"Manifest-Version: 1.0\r\nMulti-Release: true\r\n\r\n";

/// Counters reported by one archive rewrite.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelocationSummary {
    /// Entries written to the output bundle, including the fresh manifest.
    pub entries_written: usize,
    /// Compiled units that went through the rewriter.
    pub units_rewritten: usize,
    /// Entries dropped because their remapped name was already written.
    pub collisions_dropped: usize,
}

/// Rewrite one bundle into a fresh output bundle using a previously built
/// symbol map. The output is written from scratch; the input is untouched.
pub fn relocate(
    input: &Path,
    output: &Path,
    symbols: &SymbolMap,
    rules: &RelocationRules,
) -> Result<RelocationSummary, RelocateError> {
    let in_file = File::open(input).map_err(|source| RelocateError::OpenArchive {
        path: input.to_path_buf(),
        source,
    })?;
    let mut archive = tar::Archive::new(BufReader::new(in_file));
    let mut builder = tar::Builder::new(BufWriter::new(File::create(output)?));

    let mut written: HashSet<String> = HashSet::new();
    let mut summary = RelocationSummary::default();

    append_entry(&mut builder, MANIFEST_ENTRY, OUTPUT_MANIFEST)?;
    written.insert(MANIFEST_ENTRY.to_string());
    summary.entries_written += 1;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            continue;
        }
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if name.eq_ignore_ascii_case(MANIFEST_ENTRY)
            || name.to_ascii_uppercase().starts_with(SIGNATURE_PREFIX)
        {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;

        let (out_name, out_data) = if let Some(internal) = name.strip_suffix(UNIT_SUFFIX) {
            let rewritten = rewrite_unit(&data, symbols, &name)?;
            summary.units_rewritten += 1;
            let (scope, unscoped) = split_version_scope(internal);
            let mapped = symbols.get(unscoped).unwrap_or(unscoped);
            (format!("{scope}{mapped}{UNIT_SUFFIX}"), rewritten)
        } else if let Some(service) = name.strip_prefix(SERVICES_PREFIX) {
            let content = String::from_utf8_lossy(&data).into_owned();
            let body = rules.substitute_dotted(&content);
            let mapped = rules.map_dotted(service);
            (format!("{SERVICES_PREFIX}{mapped}"), body.into_bytes())
        } else {
            (rules.map_path(&name), data)
        };

        if !written.insert(out_name.clone()) {
            summary.collisions_dropped += 1;
            continue;
        }
        append_entry(&mut builder, &out_name, &out_data)?;
        summary.entries_written += 1;
    }

    let mut inner = builder.into_inner()?;
    inner.flush()?;
    Ok(summary)
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> Result<(), RelocateError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, data)?;
    Ok(())
}
