//! Shade Relocation Engine
//!
//! Rewrites the internal symbolic names inside binary archive bundles so
//! several copies of the same library can coexist in one host process:
//! - an ordered prefix-rule table (longest prefix wins),
//! - a global symbol map built up front across every input archive,
//! - a compiled-unit rewriter operating at the constant-pool level,
//! - an archive relocator that streams entries into a fresh output bundle.

pub mod archive;
pub mod error;
pub mod rules;
pub mod symbols;
pub mod unit;

pub use archive::{relocate, RelocationSummary};
pub use error::RelocateError;
pub use rules::RelocationRules;
pub use symbols::SymbolMap;
