use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::DocumentKind;
use crate::Extracted;
use crate::Extractor;
use crate::LineStore;
use crate::TechsyncConfig;
use crate::TechsyncResult;

/// Which side of a comparison an identifier is missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchSide {
	/// Listed in the primary technique table but not in the document.
	MissingFromDocument,
	/// Listed in the document but not in the primary technique table.
	MissingFromPrimary,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Mismatch {
	pub document: DocumentKind,
	pub identifier: String,
	pub side: MismatchSide,
	/// 1-based line of the identifier, in whichever document lists it.
	pub line: usize,
}

/// An identifier listed more than once in the same document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Duplicate {
	pub document: DocumentKind,
	pub identifier: String,
	/// 1-based lines of every occurrence.
	pub lines: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
	/// Number of identifiers in the primary technique table.
	pub primary_count: usize,
	pub mismatches: Vec<Mismatch>,
	pub duplicates: Vec<Duplicate>,
	/// Allow-listed identifiers that were present in a difference.
	pub allowed: Vec<String>,
}

impl ConsistencyReport {
	pub fn is_ok(&self) -> bool {
		self.mismatches.is_empty() && self.duplicates.is_empty()
	}

	/// Number of problems found.
	pub fn problem_count(&self) -> usize {
		self.mismatches.len() + self.duplicates.len()
	}
}

/// Compare the identifier sets of the CLI and documentation against the
/// primary technique table.
///
/// Each document is extracted independently and any unreadable entry line is
/// an error. Allow-listed identifiers are removed from the differences only,
/// so they never hide drift of other identifiers.
pub fn check_consistency(
	primary: &LineStore,
	cli: &LineStore,
	docs: &LineStore,
	config: &TechsyncConfig,
) -> TechsyncResult<ConsistencyReport> {
	let extractor = Extractor::new(config)?;
	let allow: BTreeSet<&str> = config.check.allow.iter().map(String::as_str).collect();

	let authoritative = extractor.technique_table(primary)?;
	let others = [
		(DocumentKind::Cli, extractor.cli_checklist(cli)?),
		(DocumentKind::Docs, extractor.docs_table(docs)?),
	];

	let primary_set = unique(&authoritative);
	let mut report = ConsistencyReport {
		primary_count: primary_set.len(),
		duplicates: duplicates(DocumentKind::Primary, &authoritative),
		..ConsistencyReport::default()
	};
	let mut allowed = BTreeSet::new();

	for (kind, extracted) in &others {
		report.duplicates.extend(duplicates(*kind, extracted));
		let document_set = unique(extracted);

		for (identifier, line) in &primary_set {
			if document_set.contains_key(identifier) {
				continue;
			}
			if allow.contains(identifier) {
				allowed.insert((*identifier).to_string());
				continue;
			}
			report.mismatches.push(Mismatch {
				document: *kind,
				identifier: (*identifier).to_string(),
				side: MismatchSide::MissingFromDocument,
				line: *line,
			});
		}

		for (identifier, line) in &document_set {
			if primary_set.contains_key(identifier) {
				continue;
			}
			if allow.contains(identifier) {
				allowed.insert((*identifier).to_string());
				continue;
			}
			report.mismatches.push(Mismatch {
				document: *kind,
				identifier: (*identifier).to_string(),
				side: MismatchSide::MissingFromPrimary,
				line: *line,
			});
		}
	}

	report.mismatches.sort();
	report.duplicates.sort();
	report.allowed = allowed.into_iter().collect();

	tracing::debug!(
		primary = report.primary_count,
		mismatches = report.mismatches.len(),
		duplicates = report.duplicates.len(),
		"checked consistency"
	);

	Ok(report)
}

/// First 1-based line of every identifier.
fn unique(extracted: &[Extracted]) -> BTreeMap<&str, usize> {
	let mut map = BTreeMap::new();
	for item in extracted {
		map.entry(item.identifier.as_str()).or_insert(item.index + 1);
	}
	map
}

fn duplicates(document: DocumentKind, extracted: &[Extracted]) -> Vec<Duplicate> {
	let mut lines: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
	for item in extracted {
		lines
			.entry(item.identifier.as_str())
			.or_default()
			.push(item.index + 1);
	}

	lines
		.into_iter()
		.filter(|(_, lines)| lines.len() > 1)
		.map(|(identifier, lines)| {
			Duplicate {
				document,
				identifier: identifier.to_string(),
				lines,
			}
		})
		.collect()
}
