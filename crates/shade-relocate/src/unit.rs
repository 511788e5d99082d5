//! Compiled-unit rewriter.
//!
//! Compiled units carry every symbolic name they define or reference in a
//! length-prefixed constant pool at the front of the unit. Rewriting a
//! text entry never shifts a pool index, so the rewriter parses the pool,
//! re-emits it with renamed text entries, and copies the remainder of the
//! unit verbatim.
//!
//! A text entry is rewritten when it is exactly a mapped internal name, or
//! when it is a descriptor/signature embedding `L<name>;` references whose
//! names are mapped. Unmapped references pass through unchanged.

use crate::error::RelocateError;
use crate::symbols::SymbolMap;

const MAGIC: u32 = 0xCAFE_BABE;

/// Constant-pool tags.
const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// Rewrite every symbolic reference in one compiled unit through the
/// symbol map, returning the reserialized unit. `entry` names the archive
/// entry for error reporting.
pub fn rewrite_unit(data: &[u8], symbols: &SymbolMap, entry: &str) -> Result<Vec<u8>, RelocateError> {
    let malformed = |reason: &str| RelocateError::MalformedUnit {
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    if data.len() < 10 {
        return Err(malformed("truncated header"));
    }
    let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    if magic != MAGIC {
        return Err(malformed("bad magic"));
    }
    let pool_count = u16::from_be_bytes([data[8], data[9]]);

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..10]);

    let mut pos = 10usize;
    let mut index = 1u16;
    while index < pool_count {
        let tag = *data.get(pos).ok_or_else(|| malformed("truncated constant pool"))?;
        match tag {
            TAG_UTF8 => {
                let len_bytes = data
                    .get(pos + 1..pos + 3)
                    .ok_or_else(|| malformed("truncated text entry"))?;
                let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
                let bytes = data
                    .get(pos + 3..pos + 3 + len)
                    .ok_or_else(|| malformed("truncated text entry"))?;

                match std::str::from_utf8(bytes).ok().and_then(|s| rewrite_text(s, symbols)) {
                    Some(rewritten) => {
                        if rewritten.len() > u16::MAX as usize {
                            return Err(malformed("rewritten name exceeds encoding limit"));
                        }
                        out.push(TAG_UTF8);
                        out.extend_from_slice(&(rewritten.len() as u16).to_be_bytes());
                        out.extend_from_slice(rewritten.as_bytes());
                    }
                    None => out.extend_from_slice(&data[pos..pos + 3 + len]),
                }
                pos += 3 + len;
            }
            TAG_CLASS | TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                let end = pos + 3;
                out.extend_from_slice(data.get(pos..end).ok_or_else(|| malformed("truncated constant pool"))?);
                pos = end;
            }
            TAG_METHOD_HANDLE => {
                let end = pos + 4;
                out.extend_from_slice(data.get(pos..end).ok_or_else(|| malformed("truncated constant pool"))?);
                pos = end;
            }
            TAG_INTEGER | TAG_FLOAT | TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF
            | TAG_NAME_AND_TYPE | TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => {
                let end = pos + 5;
                out.extend_from_slice(data.get(pos..end).ok_or_else(|| malformed("truncated constant pool"))?);
                pos = end;
            }
            TAG_LONG | TAG_DOUBLE => {
                let end = pos + 9;
                out.extend_from_slice(data.get(pos..end).ok_or_else(|| malformed("truncated constant pool"))?);
                pos = end;
                // Wide constants occupy two pool slots.
                index += 1;
            }
            _ => return Err(malformed("unknown constant tag")),
        }
        index += 1;
    }

    out.extend_from_slice(&data[pos..]);
    Ok(out)
}

/// Rewrite one pool text entry; `None` means unchanged.
fn rewrite_text(s: &str, symbols: &SymbolMap) -> Option<String> {
    if let Some(new) = symbols.get(s) {
        return Some(new.to_string());
    }
    if s.starts_with('(') || s.starts_with('L') || s.starts_with('[') || s.starts_with('<') {
        return rewrite_references(s, symbols);
    }
    None
}

/// Rewrite embedded `L<name>;` references in a descriptor or signature.
/// Generic signatures terminate a name at `<` as well as `;`.
fn rewrite_references(s: &str, symbols: &SymbolMap) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut changed = false;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'L' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != b';' && bytes[j] != b'<' {
                j += 1;
            }
            let name = &s[i + 1..j];
            match symbols.get(name) {
                Some(new) => {
                    out.push('L');
                    out.push_str(new);
                    changed = true;
                }
                None => out.push_str(&s[i..j]),
            }
            i = j;
        } else {
            // Advance one whole character; names are always ASCII-delimited.
            let ch = s[i..].chars().next().unwrap_or('\0');
            out.push(ch);
            i += ch.len_utf8().max(1);
        }
    }

    changed.then_some(out)
}
