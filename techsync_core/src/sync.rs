//! Inserting one entry across every document at its anchors.

use serde::Serialize;

use crate::DocumentKind;
use crate::DocumentSet;
use crate::Entry;
use crate::Extractor;
use crate::LineStore;
use crate::PlatformSet;
use crate::Renderer;
use crate::Slot;
use crate::TechsyncConfig;
use crate::TechsyncError;
use crate::TechsyncResult;
use crate::anchor;
use crate::locate_source_line;

/// A logical insertion point and the literal marker that locates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
	pub slot: Slot,
	pub marker: String,
}

impl Anchor {
	pub fn new(slot: Slot, marker: impl Into<String>) -> Self {
		Self {
			slot,
			marker: marker.into(),
		}
	}

	/// The four insertion points of the primary document.
	pub fn primary(config: &TechsyncConfig) -> Vec<Self> {
		let anchors = &config.anchors;
		vec![
			Self::new(Slot::Enum, &anchors.enum_slot),
			Self::new(Slot::Implementation, &anchors.implementation_slot),
			Self::new(Slot::Table, &anchors.table_slot),
			Self::new(Slot::StringCase, &anchors.string_case_slot),
		]
	}

	/// The checklist insertion point plus one case per supported platform.
	pub fn cli(config: &TechsyncConfig, platforms: PlatformSet) -> Vec<Self> {
		let anchors = &config.anchors;
		let mut result = vec![Self::new(Slot::Checker, &anchors.checker_slot)];

		if platforms.linux {
			result.push(Self::new(Slot::Linux, &anchors.linux_slot));
		}
		if platforms.windows {
			result.push(Self::new(Slot::Windows, &anchors.windows_slot));
		}
		if platforms.macos {
			result.push(Self::new(Slot::MacOs, &anchors.macos_slot));
		}

		result
	}

	pub fn docs(config: &TechsyncConfig) -> Vec<Self> {
		vec![Self::new(Slot::DocsRow, &config.anchors.docs_row_slot)]
	}
}

/// The outcome of patching one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentUpdate {
	pub kind: DocumentKind,
	/// Number of anchors the document must receive an update at.
	pub expected: usize,
	/// Number of anchors that actually received lines.
	pub realized: usize,
	pub inserted_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
	pub identifier: String,
	pub updates: Vec<DocumentUpdate>,
	/// 1-based line of the new implementation in the primary document.
	pub source_line: Option<usize>,
}

impl SyncReport {
	pub fn update(&self, kind: DocumentKind) -> Option<&DocumentUpdate> {
		self.updates.iter().find(|update| update.kind == kind)
	}
}

/// Applies a new entry to the primary, CLI and documentation documents.
///
/// Every document is patched in memory first. The [`DocumentSet`] is only
/// replaced once all three documents resolved every anchor and received the
/// expected number of updates, so a failure leaves both the in-memory set and
/// the files untouched.
pub struct Synchronizer<'a> {
	config: &'a TechsyncConfig,
	extractor: Extractor,
	renderer: Renderer<'a>,
}

impl<'a> Synchronizer<'a> {
	pub fn new(config: &'a TechsyncConfig) -> TechsyncResult<Self> {
		Ok(Self {
			config,
			extractor: Extractor::new(config)?,
			renderer: Renderer::new(config)?,
		})
	}

	/// Patch `documents` in memory. Fills in the entry's `source_line` and
	/// `generated_link` from the patched primary document.
	pub fn plan(&self, entry: &mut Entry, documents: &mut DocumentSet) -> TechsyncResult<SyncReport> {
		self.ensure_new(entry, documents)?;

		let mut primary = documents.primary.lines.clone();
		let primary_update = self.patch(
			&mut primary,
			DocumentKind::Primary,
			&Anchor::primary(self.config),
			entry,
		)?;

		entry.source_line = locate_source_line(&primary, &self.extractor, &entry.identifier);
		entry.generated_link = entry.source_line.map(|line| self.config.links.link_to(line));
		if entry.source_line.is_none() {
			tracing::warn!(identifier = entry.identifier, "implementation not found after insertion");
		}

		let mut cli = documents.cli.lines.clone();
		let cli_update = self.patch(
			&mut cli,
			DocumentKind::Cli,
			&Anchor::cli(self.config, entry.platforms),
			entry,
		)?;

		let mut docs = documents.docs.lines.clone();
		let docs_update = self.patch(&mut docs, DocumentKind::Docs, &Anchor::docs(self.config), entry)?;

		documents.primary.lines = primary;
		documents.cli.lines = cli;
		documents.docs.lines = docs;

		Ok(SyncReport {
			identifier: entry.identifier.clone(),
			updates: vec![primary_update, cli_update, docs_update],
			source_line: entry.source_line,
		})
	}

	/// Plan the insertion and save every document.
	pub fn apply(&self, entry: &mut Entry, documents: &mut DocumentSet) -> TechsyncResult<SyncReport> {
		let report = self.plan(entry, documents)?;
		documents.save()?;
		tracing::info!(identifier = entry.identifier, "synchronized entry");

		Ok(report)
	}

	/// The identifier must not exist in any document yet.
	fn ensure_new(&self, entry: &Entry, documents: &DocumentSet) -> TechsyncResult<()> {
		let existing = [
			self.extractor.technique_table(&documents.primary.lines)?,
			self.extractor.cli_checklist(&documents.cli.lines)?,
			self.extractor.docs_table(&documents.docs.lines)?,
		];

		if existing
			.iter()
			.flatten()
			.any(|extracted| extracted.identifier == entry.identifier)
		{
			return Err(TechsyncError::DuplicateIdentifier(entry.identifier.clone()));
		}

		Ok(())
	}

	fn patch(
		&self,
		lines: &mut LineStore,
		kind: DocumentKind,
		anchors: &[Anchor],
		entry: &Entry,
	) -> TechsyncResult<DocumentUpdate> {
		let mut resolved = Vec::with_capacity(anchors.len());
		for anchor in anchors {
			resolved.push((anchor::find_unique(lines, &anchor.marker)?, anchor.slot));
		}

		// later anchors first so earlier indices stay valid
		resolved.sort_by(|a, b| b.0.cmp(&a.0));

		let tag = (kind == DocumentKind::Primary && entry.is_restricted())
			.then_some(self.config.license.tag.as_str());
		let mut realized = 0;
		let mut inserted_lines = 0;

		for (index, slot) in resolved {
			let indent = anchor::indentation(&lines[index]).to_string();
			let rendered = self.renderer.render(slot, entry)?;
			let count = lines.splice_after(index, indent_lines(&indent, tag, rendered))?;

			tracing::debug!(
				document = lines.label(),
				slot = slot.name(),
				line = index + 1,
				count,
				"spliced entry"
			);

			if count > 0 {
				realized += 1;
				inserted_lines += count;
			}
		}

		if realized != anchors.len() {
			return Err(TechsyncError::UpdateCountMismatch {
				document: lines.label().to_string(),
				expected: anchors.len(),
				realized,
			});
		}

		Ok(DocumentUpdate {
			kind,
			expected: anchors.len(),
			realized,
			inserted_lines,
		})
	}
}

/// Prefix rendered lines with the anchor's indentation and, for restricted
/// entries, the restriction tag. Empty lines get no trailing whitespace.
fn indent_lines(indent: &str, tag: Option<&str>, lines: Vec<String>) -> Vec<String> {
	lines
		.into_iter()
		.map(|line| {
			match (tag, line.is_empty()) {
				(Some(tag), true) => format!("{indent}{tag}"),
				(Some(tag), false) => format!("{indent}{tag} {line}"),
				(None, true) => line,
				(None, false) => format!("{indent}{line}"),
			}
		})
		.collect()
}
