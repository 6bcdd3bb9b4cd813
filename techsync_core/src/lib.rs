//! `techsync_core` keeps the technique catalog of a VM detection library
//! synchronized across the documents that describe it: the dual-licensed
//! header, its MIT-only variant, the companion CLI source and the markdown
//! documentation table.
//!
//! ## Pipeline
//!
//! ```text
//! Entry draft
//!   → Validation (one validator per field, re-prompted by the CLI)
//!   → Synchronizer (renders the entry at every anchor of primary, CLI, docs)
//!   → License variant (drops restricted lines, swaps the license block)
//!
//! Primary header
//!   → Consistency check (identifier sets of every document must agree)
//!   → Sections banner + version banner recomputation
//!   → Registry harvest → generated source links in the docs table
//! ```
//!
//! ## Modules
//!
//! - [`lines`]: Documents as ordered, mutable line sequences with atomic saves.
//! - [`anchor`]: Locating marker lines and marker-bounded regions.
//! - [`extract`]: The only place that pattern-matches identifiers out of document text.
//! - [`sync`]: Transactional insertion of one entry across every document.
//! - [`variant`]: Deriving the license-filtered secondary header.
//! - [`sections`]: Recomputing line references after edits.
//! - [`check`]: Cross-document consistency checking.
//! - [`config`]: Loading `techsync.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use techsync_core::DocumentSet;
//! use techsync_core::TechsyncConfig;
//! use techsync_core::check_consistency;
//!
//! let root = Path::new(".");
//! let config = TechsyncConfig::load_or_default(root).unwrap();
//! let documents = DocumentSet::load(root, &config).unwrap();
//!
//! let report = check_consistency(
//! 	&documents.primary.lines,
//! 	&documents.cli.lines,
//! 	&documents.docs.lines,
//! 	&config,
//! )
//! .unwrap();
//!
//! for mismatch in &report.mismatches {
//! 	eprintln!("{}: {}", mismatch.document, mismatch.identifier);
//! }
//! ```

pub use check::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use extract::*;
pub use lines::*;
pub use registry::*;
pub use render::*;
pub use sections::*;
pub use sync::*;
pub use variant::*;
pub use workspace::*;

pub mod anchor;
pub mod check;
pub mod config;
mod entry;
#[allow(unused_assignments)]
mod error;
pub mod extract;
pub mod lines;
mod registry;
mod render;
pub mod sections;
pub mod sync;
pub mod variant;
mod workspace;

#[cfg(test)]
mod __fixtures;
