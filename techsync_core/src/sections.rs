//! Recomputing positional metadata after edits change a document's geometry.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::Extractor;
use crate::LineStore;
use crate::LinksConfig;
use crate::Registry;
use crate::SectionsConfig;
use crate::TechsyncError;
use crate::TechsyncResult;
use crate::VersionConfig;
use crate::anchor;

/// Where one structural region starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionPosition {
	pub label: String,
	/// Line number, counted from the configured `line_base`.
	pub line: usize,
	/// `false` when the marker was never seen and the position was inherited
	/// from the previous region.
	pub found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
	pub positions: Vec<SectionPosition>,
	/// The banner lines as written.
	pub banner: Vec<String>,
	pub changed: bool,
}

/// Locate every configured region with a single forward scan.
///
/// Markers are expected in their configured order. The scan only advances to
/// the next region once the current region's marker has been seen, so a
/// marker appearing before its predecessor is ignored. A region whose marker
/// never appears inherits the position of the region before it; the first
/// region must always be found.
pub fn scan_sections(lines: &LineStore, config: &SectionsConfig) -> TechsyncResult<Vec<SectionPosition>> {
	let regions = &config.regions;
	let mut found: Vec<Option<usize>> = vec![None; regions.len()];
	let mut cursor = 0;

	for (index, line) in lines.iter().enumerate() {
		let Some(region) = regions.get(cursor) else {
			break;
		};

		if line.contains(region.marker.as_str()) {
			found[cursor] = Some(index + config.line_base);
			cursor += 1;
		}
	}

	let mut positions: Vec<SectionPosition> = Vec::with_capacity(regions.len());
	for (region, line) in regions.iter().zip(found) {
		let position = match (line, positions.last()) {
			(Some(line), _) => {
				SectionPosition {
					label: region.label.clone(),
					line,
					found: true,
				}
			}
			(None, Some(previous)) => {
				tracing::warn!(
					document = lines.label(),
					marker = region.marker,
					"section marker not found, using the previous section's line"
				);
				SectionPosition {
					label: region.label.clone(),
					line: previous.line,
					found: false,
				}
			}
			(None, None) => {
				return Err(TechsyncError::MissingAnchor {
					document: lines.label().to_string(),
					marker: region.marker.clone(),
				});
			}
		};
		positions.push(position);
	}

	Ok(positions)
}

/// Render one banner line per position, then apply the configured swap.
pub fn render_banner(positions: &[SectionPosition], config: &SectionsConfig) -> TechsyncResult<Vec<String>> {
	let width = positions
		.iter()
		.map(|position| position.label.chars().count())
		.max()
		.unwrap_or_default()
		+ 2;

	let mut banner: Vec<String> = positions
		.iter()
		.map(|position| {
			format!(
				"{}{:<width$}=> line {}",
				config.line_prefix, position.label, position.line
			)
		})
		.collect();

	if let Some([first, second]) = config.banner_swap {
		if first.abs_diff(second) != 1 || first.max(second) >= banner.len() {
			return Err(TechsyncError::InvalidBannerSwap { first, second });
		}

		banner.swap(first, second);
	}

	Ok(banner)
}

/// Rewrite the `SECTIONS` banner of `lines` with the current region
/// positions. The banner has one line per region and starts on the line
/// after the heading.
pub fn recompute_sections(lines: &mut LineStore, config: &SectionsConfig) -> TechsyncResult<SectionReport> {
	let heading = anchor::find(lines, &config.heading).ok_or_else(|| {
		TechsyncError::MissingSectionsHeading {
			document: lines.label().to_string(),
			heading: config.heading.clone(),
		}
	})?;

	let positions = scan_sections(lines, config)?;
	let banner = render_banner(&positions, config)?;

	let first = heading + 1;
	if first + banner.len() > lines.len() {
		return Err(TechsyncError::LineOutOfRange {
			document: lines.label().to_string(),
			line: first + banner.len(),
			len: lines.len(),
		});
	}

	let mut changed = false;
	for (offset, line) in banner.iter().enumerate() {
		let previous = lines.replace(first + offset, line.clone())?;
		changed |= previous != *line;
	}

	tracing::debug!(document = lines.label(), changed, "recomputed sections banner");
	Ok(SectionReport {
		positions,
		banner,
		changed,
	})
}

/// Rewrite the version banner line to `<banner><version> (<Month> <Year>)`.
///
/// The version is the first `MAJOR.MINOR` number in `override_version` when
/// given, otherwise in the existing banner line. Returns the version written.
pub fn recompute_version(
	lines: &mut LineStore,
	config: &VersionConfig,
	override_version: Option<&str>,
	date: NaiveDate,
) -> TechsyncResult<String> {
	let index = anchor::find(lines, &config.banner).ok_or_else(|| {
		TechsyncError::MissingAnchor {
			document: lines.label().to_string(),
			marker: config.banner.clone(),
		}
	})?;

	let pattern = Regex::new(r"\d+\.\d+").map_err(|e| TechsyncError::ConfigParse(e.to_string()))?;
	let source = override_version.unwrap_or(&lines[index]);
	let version = pattern
		.find(source)
		.map(|m| m.as_str().to_string())
		.ok_or_else(|| TechsyncError::MalformedVersion(source.trim().to_string()))?;

	let line = format!("{}{version} ({})", config.banner, date.format("%B %Y"));
	lines.replace(index, line)?;
	tracing::debug!(document = lines.label(), version, "updated version banner");

	Ok(version)
}

/// Point every generated source link in the documentation table at the
/// entry's current line. Returns the number of rows changed.
pub fn refresh_links(
	docs: &mut LineStore,
	registry: &Registry,
	extractor: &Extractor,
	links: &LinksConfig,
) -> TechsyncResult<usize> {
	let pattern = Regex::new(&format!(r"{}#L\d+", regex::escape(&links.base)))
		.map_err(|e| TechsyncError::ConfigParse(e.to_string()))?;
	let (start, end) = extractor.docs_table_range(docs)?;
	let mut changed = 0;

	for index in (start + 1)..end {
		let Some(identifier) = extractor.markdown_row(&docs[index]) else {
			continue;
		};
		let Some(link) = registry
			.get(&identifier)
			.and_then(|entry| entry.generated_link.as_deref())
		else {
			continue;
		};

		let updated = pattern
			.replace_all(&docs[index], regex::NoExpand(link))
			.into_owned();
		if updated != docs[index] {
			docs.replace(index, updated)?;
			changed += 1;
		}
	}

	tracing::debug!(document = docs.label(), changed, "refreshed source links");
	Ok(changed)
}
