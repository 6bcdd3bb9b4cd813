//! Locating marker lines inside a [`LineStore`].
//!
//! Every search is a plain, case-sensitive substring match per line unless
//! noted otherwise. Indices are zero-based.

use crate::LineStore;
use crate::TechsyncError;
use crate::TechsyncResult;

/// First line containing `marker`, scanning forward.
pub fn find(lines: &[String], marker: &str) -> Option<usize> {
	lines.iter().position(|line| line.contains(marker))
}

/// First line containing `marker` when scanning from the end of the document.
pub fn find_last(lines: &[String], marker: &str) -> Option<usize> {
	lines.iter().rposition(|line| line.contains(marker))
}

/// First line whose trimmed content equals `text`. Used for markdown
/// headings, where `# Flag table` must not match `## Flag table notes`.
pub fn find_exact(lines: &[String], text: &str) -> Option<usize> {
	lines.iter().position(|line| line.trim() == text)
}

/// The single line containing `marker`.
///
/// Fails when the marker is absent or appears more than once, so an
/// insertion point is never ambiguous.
pub fn find_unique(lines: &LineStore, marker: &str) -> TechsyncResult<usize> {
	let mut matches = lines
		.iter()
		.enumerate()
		.filter(|(_, line)| line.contains(marker))
		.map(|(index, _)| index);

	let Some(first) = matches.next() else {
		return Err(missing(lines, marker));
	};

	let extra = matches.count();
	if extra > 0 {
		return Err(TechsyncError::DuplicateAnchor {
			document: lines.label().to_string(),
			marker: marker.to_string(),
			count: extra + 1,
		});
	}

	tracing::debug!(document = lines.label(), marker, line = first + 1, "resolved anchor");
	Ok(first)
}

/// The region bounded by the first `start` marker and the first `end` marker
/// after it, scanning forward.
pub fn find_range(lines: &LineStore, start: &str, end: &str) -> TechsyncResult<(usize, usize)> {
	let start_index = find(lines, start).ok_or_else(|| missing(lines, start))?;
	let end_index = find(lines, end).ok_or_else(|| missing(lines, end))?;
	validate_range(lines, start, end, start_index, end_index)
}

/// The region closest to the end of the document.
///
/// The `end` marker is the last occurrence in the document and the `start`
/// marker is the last occurrence before it. Earlier mentions of either
/// marker, such as a commented example of the table above the real one, are
/// ignored.
pub fn find_range_from_end(
	lines: &LineStore,
	start: &str,
	end: &str,
) -> TechsyncResult<(usize, usize)> {
	let end_index = find_last(lines, end).ok_or_else(|| missing(lines, end))?;
	let start_index = find_last(&lines[..end_index], start).ok_or_else(|| {
		if find(lines, start).is_some() {
			invalid_range(lines, start, end)
		} else {
			missing(lines, start)
		}
	})?;

	validate_range(lines, start, end, start_index, end_index)
}

/// Like [`find_range`] but the bounds must match a trimmed line exactly.
pub fn find_heading_range(
	lines: &LineStore,
	start: &str,
	end: &str,
) -> TechsyncResult<(usize, usize)> {
	let start_index = find_exact(lines, start).ok_or_else(|| missing(lines, start))?;
	let end_index = find_exact(lines, end).ok_or_else(|| missing(lines, end))?;
	validate_range(lines, start, end, start_index, end_index)
}

/// Leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
	&line[..line.len() - line.trim_start().len()]
}

fn validate_range(
	lines: &LineStore,
	start: &str,
	end: &str,
	start_index: usize,
	end_index: usize,
) -> TechsyncResult<(usize, usize)> {
	if end_index <= start_index {
		return Err(invalid_range(lines, start, end));
	}

	Ok((start_index, end_index))
}

fn missing(lines: &LineStore, marker: &str) -> TechsyncError {
	TechsyncError::MissingAnchor {
		document: lines.label().to_string(),
		marker: marker.to_string(),
	}
}

fn invalid_range(lines: &LineStore, start: &str, end: &str) -> TechsyncError {
	TechsyncError::InvalidRange {
		document: lines.label().to_string(),
		start: start.to_string(),
		end: end.to_string(),
	}
}
