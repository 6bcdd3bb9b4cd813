//! Recovering catalog identifiers from document text.
//!
//! This is the only module that pattern-matches entry lines. Each document
//! type has its own convention: `NS::IDENTIFIER` tokens in the primary
//! technique table, the first backtick span of a markdown row, and the first
//! argument of the checklist call in the CLI.

use regex::Regex;

use crate::LineStore;
use crate::TechsyncConfig;
use crate::TechsyncError;
use crate::TechsyncResult;
use crate::anchor;

/// An identifier together with the zero-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
	pub identifier: String,
	pub index: usize,
}

/// Compiled patterns for every document convention.
#[derive(Debug, Clone)]
pub struct Extractor {
	prefix: String,
	identifier: Regex,
	backtick: Regex,
	call: Regex,
	row: Regex,
	implements: Regex,
	call_text: String,
	tag: String,
	wrappers: Vec<String>,
	table_bounds: (String, String),
	docs_bounds: (String, String),
}

impl Extractor {
	pub fn new(config: &TechsyncConfig) -> TechsyncResult<Self> {
		let namespace = regex::escape(&config.namespace);
		let identifier = compile(&format!(r"\b{namespace}::([A-Z0-9_]+)\b"))?;
		let backtick = compile(r"`([^`]+)`")?;
		let call = compile(&format!(r"{}\s*([^,]+?)\s*,", regex::escape(&config.cli.call)))?;
		let row = compile(&format!(r"\{{\s*(\d+)\s*,\s*{namespace}::([A-Za-z0-9_]+)"))?;
		let implements = compile(&format!(r"@implements\s+{namespace}::([A-Z0-9_]+)\b"))?;

		Ok(Self {
			prefix: config.namespace_prefix(),
			identifier,
			backtick,
			call,
			row,
			implements,
			call_text: config.cli.call.clone(),
			tag: config.license.tag.clone(),
			wrappers: config.table.wrappers.clone(),
			table_bounds: (config.table.start.clone(), config.table.end.clone()),
			docs_bounds: (config.docs_table.start.clone(), config.docs_table.end.clone()),
		})
	}

	/// The first `NS::IDENTIFIER` token on `line`, without its namespace.
	pub fn identifier(&self, line: &str) -> Option<String> {
		self.identifier
			.captures(line)
			.and_then(|captures| captures.get(1))
			.map(|m| m.as_str().to_string())
	}

	/// The identifier named by an `@implements NS::IDENTIFIER` tag on `line`.
	pub fn implements(&self, line: &str) -> Option<String> {
		self.implements
			.captures(line)
			.and_then(|captures| captures.get(1))
			.map(|m| m.as_str().to_string())
	}

	/// Score and implementation function of a technique table row such as
	/// `{ VM::VMID, { 100, VM::vmid } },`.
	pub fn table_row_details(&self, line: &str) -> Option<(u8, String)> {
		let captures = self.row.captures(line)?;
		let score = captures.get(1)?.as_str().parse().ok()?;
		let function = captures.get(2)?.as_str().to_string();
		Some((score, function))
	}

	/// Remove the namespace prefix from `value` if present.
	pub fn strip_namespace<'a>(&self, value: &'a str) -> &'a str {
		value.strip_prefix(self.prefix.as_str()).unwrap_or(value)
	}

	/// Whether `line` is expected to reference exactly one entry.
	///
	/// Blank lines, full-line comments, statements (anything with `;`),
	/// closing braces and metadata wrappers are skipped. The restriction tag
	/// is removed first so restricted rows are still considered.
	pub fn is_candidate(&self, line: &str) -> bool {
		let untagged = self.untag(line);
		let trimmed = untagged.trim();

		!(trimmed.is_empty()
			|| trimmed.starts_with("//")
			|| trimmed.contains(';')
			|| trimmed.starts_with('}')
			|| self
				.wrappers
				.iter()
				.any(|wrapper| trimmed.contains(wrapper.as_str())))
	}

	/// Whether `line` carries the restriction tag.
	pub fn is_restricted(&self, line: &str) -> bool {
		!self.tag.is_empty() && line.contains(self.tag.as_str())
	}

	/// `line` with the restriction tag removed.
	pub fn untag(&self, line: &str) -> String {
		if self.tag.is_empty() {
			line.to_string()
		} else {
			line.replacen(self.tag.as_str(), "", 1)
		}
	}

	/// Locate the technique table of the primary document. The region closest
	/// to the end of the file wins.
	pub fn technique_table_range(&self, lines: &LineStore) -> TechsyncResult<(usize, usize)> {
		anchor::find_range_from_end(lines, &self.table_bounds.0, &self.table_bounds.1)
	}

	/// Every identifier in the primary technique table, in table order.
	///
	/// Each candidate line must yield an identifier. A single unreadable line
	/// fails the whole extraction, since skipping it would hide drift.
	pub fn technique_table(&self, lines: &LineStore) -> TechsyncResult<Vec<Extracted>> {
		let (start, end) = self.technique_table_range(lines)?;
		let mut extracted = Vec::new();

		for index in (start + 1)..end {
			let line = &lines[index];
			if !self.is_candidate(line) {
				continue;
			}

			let identifier = self
				.identifier(line)
				.ok_or_else(|| extraction_error(lines, index))?;
			extracted.push(Extracted { identifier, index });
		}

		Ok(extracted)
	}

	/// The identifier of a markdown table row: its first backtick span.
	pub fn markdown_row(&self, line: &str) -> Option<String> {
		self.backtick
			.captures(line)
			.and_then(|captures| captures.get(1))
			.map(|m| self.strip_namespace(m.as_str().trim()).to_string())
	}

	/// Locate the flag table of the documentation.
	pub fn docs_table_range(&self, lines: &LineStore) -> TechsyncResult<(usize, usize)> {
		anchor::find_heading_range(lines, &self.docs_bounds.0, &self.docs_bounds.1)
	}

	/// Every identifier in the documentation flag table. Only rows mentioning
	/// the namespace are considered.
	pub fn docs_table(&self, lines: &LineStore) -> TechsyncResult<Vec<Extracted>> {
		let (start, end) = self.docs_table_range(lines)?;
		let mut extracted = Vec::new();

		for index in (start + 1)..end {
			let line = &lines[index];
			if line.trim().is_empty() || !line.contains(self.prefix.as_str()) {
				continue;
			}

			let identifier = self
				.markdown_row(line)
				.ok_or_else(|| extraction_error(lines, index))?;
			extracted.push(Extracted { identifier, index });
		}

		Ok(extracted)
	}

	/// Every identifier passed to the checklist call in the CLI source.
	/// Only call statements count: commented-out calls and the definition of
	/// the checklist function itself are skipped.
	pub fn cli_checklist(&self, lines: &LineStore) -> TechsyncResult<Vec<Extracted>> {
		let mut extracted = Vec::new();

		for (index, line) in lines.iter().enumerate() {
			let trimmed = line.trim();
			if trimmed.starts_with("//")
				|| !trimmed.ends_with(';')
				|| !trimmed.contains(self.call_text.as_str())
			{
				continue;
			}

			let identifier = self
				.call
				.captures(trimmed)
				.and_then(|captures| captures.get(1))
				.map(|m| self.strip_namespace(m.as_str()).to_string())
				.ok_or_else(|| extraction_error(lines, index))?;
			extracted.push(Extracted { identifier, index });
		}

		Ok(extracted)
	}
}

fn compile(pattern: &str) -> TechsyncResult<Regex> {
	Regex::new(pattern).map_err(|e| TechsyncError::ConfigParse(e.to_string()))
}

fn extraction_error(lines: &LineStore, index: usize) -> TechsyncError {
	TechsyncError::Extraction {
		document: lines.label().to_string(),
		line: index + 1,
		text: lines[index].trim().to_string(),
	}
}
