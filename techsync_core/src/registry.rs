use std::collections::BTreeMap;

use crate::Entry;
use crate::Extracted;
use crate::Extractor;
use crate::LicenseClass;
use crate::LineStore;
use crate::TechsyncConfig;
use crate::TechsyncError;
use crate::TechsyncResult;
use crate::optional;

/// The canonical in-memory catalog, keyed by identifier.
///
/// A registry is an explicit value passed between pipeline stages. It is
/// either filled one validated [`Entry`] at a time or rebuilt from the primary
/// document with [`Registry::harvest`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
	entries: BTreeMap<String, Entry>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add `entry`. Identifiers are primary keys, so a second entry with the
	/// same identifier is rejected.
	pub fn insert(&mut self, entry: Entry) -> TechsyncResult<()> {
		if self.entries.contains_key(&entry.identifier) {
			return Err(TechsyncError::DuplicateIdentifier(entry.identifier));
		}

		self.entries.insert(entry.identifier.clone(), entry);
		Ok(())
	}

	pub fn get(&self, identifier: &str) -> Option<&Entry> {
		self.entries.get(identifier)
	}

	pub fn contains(&self, identifier: &str) -> bool {
		self.entries.contains_key(identifier)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Entries in identifier order.
	pub fn iter(&self) -> impl Iterator<Item = &Entry> {
		self.entries.values()
	}

	pub fn identifiers(&self) -> Vec<&str> {
		self.entries.keys().map(String::as_str).collect()
	}

	/// Rebuild the registry from the primary document.
	///
	/// Identifiers come from the technique table and must all be readable.
	/// Everything else is best effort per entry: a row without a score, or an
	/// identifier without a metadata block, leaves those fields empty and
	/// logs a warning instead of failing the run.
	pub fn harvest(primary: &LineStore, config: &TechsyncConfig) -> TechsyncResult<Self> {
		let extractor = Extractor::new(config)?;
		let mut registry = Self::new();

		for Extracted { identifier, index } in extractor.technique_table(primary)? {
			let row = &primary[index];
			let mut entry = Entry {
				identifier: identifier.clone(),
				..Entry::default()
			};

			if let Some((score, function)) = extractor.table_row_details(row) {
				entry.score = score;
				entry.implementation_reference = function;
			} else {
				tracing::warn!(identifier, line = index + 1, "no score found in technique table row");
			}

			if extractor.is_restricted(row) {
				entry.license = LicenseClass::Restricted;
			}

			let block = find_reference(primary, &extractor, &identifier)
				.and_then(|reference| metadata_block(primary, &extractor, reference));

			match block {
				Some(block) => {
					apply_metadata(&mut entry, &primary[block.start..=block.end], &extractor);
					let line = block.source_line();
					entry.source_line = Some(line);
					entry.generated_link = Some(config.links.link_to(line));
				}
				None => {
					tracing::warn!(identifier, "no metadata block found, descriptive fields left empty");
				}
			}

			registry.insert(entry)?;
		}

		tracing::debug!(entries = registry.len(), "harvested registry");
		Ok(registry)
	}
}

/// The comment lines describing one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBlock {
	/// Zero-based index of the first comment line.
	pub start: usize,
	/// Zero-based index of the last comment line.
	pub end: usize,
}

impl MetadataBlock {
	/// 1-based line of the implementation that follows the block.
	pub fn source_line(self) -> usize {
		self.end + 2
	}
}

/// The line tagging the implementation of `identifier` with `@implements`.
pub fn find_reference(lines: &[String], extractor: &Extractor, identifier: &str) -> Option<usize> {
	lines
		.iter()
		.position(|line| extractor.implements(line).as_deref() == Some(identifier))
}

/// The comment block surrounding the reference line at `reference`.
///
/// A `/** ... */` block is found by walking backward to the opening and
/// forward to the closing delimiter. Restricted entries use a run of `//`
/// comments instead, bounded by the first non-comment line above and the
/// first line without an `@` tag below.
pub fn metadata_block(
	lines: &[String],
	extractor: &Extractor,
	reference: usize,
) -> Option<MetadataBlock> {
	let comment = |index: usize| -> String { extractor.untag(&lines[index]).trim().to_string() };

	if comment(reference).starts_with("//") {
		let mut start = reference;
		while start > 0 && comment(start - 1).starts_with("//") {
			start -= 1;
		}

		// the implementation may itself open with `//` comments
		let tagged = |index: usize| {
			let text = comment(index);
			text.starts_with("//") && comment_text(&text).starts_with('@')
		};
		let mut end = reference;
		while end + 1 < lines.len() && tagged(end + 1) {
			end += 1;
		}

		return Some(MetadataBlock { start, end });
	}

	let mut start = None;
	for index in (0..=reference).rev() {
		let text = comment(index);
		if text.starts_with("/**") {
			start = Some(index);
			break;
		}

		// walked out of a different block
		if index != reference && text.ends_with("*/") {
			return None;
		}
	}
	let start = start?;

	let end = (reference..lines.len()).find(|index| comment(*index).ends_with("*/"))?;

	Some(MetadataBlock { start, end })
}

/// 1-based line of the implementation of `identifier`.
pub fn locate_source_line(lines: &[String], extractor: &Extractor, identifier: &str) -> Option<usize> {
	let reference = find_reference(lines, extractor, identifier)?;
	metadata_block(lines, extractor, reference).map(MetadataBlock::source_line)
}

fn apply_metadata(entry: &mut Entry, block: &[String], extractor: &Extractor) {
	for line in block {
		let untagged = extractor.untag(line);
		let text = comment_text(&untagged);
		let Some((tag, value)) = text.split_once(char::is_whitespace) else {
			continue;
		};
		let value = value.trim();

		match tag {
			"@brief" => entry.long_description = value.to_string(),
			"@category" => entry.apply_categories(value),
			"@author" => entry.author = optional(value),
			"@link" => entry.source_link = optional(value),
			"@note" => entry.notes = optional(value),
			"@warning" => {
				let lower = value.to_lowercase();
				if lower.contains("admin") || lower.contains("privilege") {
					entry.requires_admin = true;
				}
			}
			_ => {}
		}
	}
}

fn comment_text(line: &str) -> &str {
	let trimmed = line.trim();
	trimmed
		.strip_prefix("/**")
		.or_else(|| trimmed.strip_prefix("//"))
		.or_else(|| trimmed.strip_prefix('*'))
		.unwrap_or(trimmed)
		.trim()
}
