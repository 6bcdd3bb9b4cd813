use std::path::Path;

use crate::LicenseConfig;
use crate::LineStore;
use crate::TechsyncConfig;
use crate::TechsyncError;
use crate::TechsyncResult;
use crate::recompute_sections;

/// Derive the license variant of `primary`.
///
/// Lines carrying the restriction tag are dropped and the license declaration
/// line is replaced with the alternate block. Every other line passes through
/// unchanged. The result depends only on `primary` and `license`, so deriving
/// twice from the same primary gives identical output.
pub fn derive_variant(primary: &LineStore, license: &LicenseConfig) -> TechsyncResult<LineStore> {
	let replacement: Vec<String> = license.replacement.lines().map(str::to_string).collect();
	let mut lines = Vec::with_capacity(primary.len() + replacement.len());
	let mut dropped = 0;
	let mut markers = 0;

	for line in primary.iter() {
		if !license.tag.is_empty() && line.contains(license.tag.as_str()) {
			dropped += 1;
			continue;
		}

		if line.contains(license.marker.as_str()) {
			markers += 1;
			lines.extend(replacement.iter().cloned());
			continue;
		}

		lines.push(line.clone());
	}

	match markers {
		0 => {
			return Err(TechsyncError::MissingAnchor {
				document: primary.label().to_string(),
				marker: license.marker.clone(),
			});
		}
		1 => {}
		count => {
			return Err(TechsyncError::DuplicateAnchor {
				document: primary.label().to_string(),
				marker: license.marker.clone(),
				count,
			});
		}
	}

	tracing::debug!(document = primary.label(), dropped, "derived license variant");
	Ok(primary.with_lines(primary.label(), lines))
}

/// Derive the secondary document of `primary`.
///
/// Dropping restricted lines moves every region below them, so the copied
/// `SECTIONS` banner is recomputed against the variant's own geometry. The
/// version banner is carried over from the primary unchanged.
pub fn derive_secondary(primary: &LineStore, config: &TechsyncConfig) -> TechsyncResult<LineStore> {
	let mut secondary = derive_variant(primary, &config.license)?;
	secondary.set_label(config.documents.secondary.display().to_string());
	recompute_sections(&mut secondary, &config.sections)?;

	Ok(secondary)
}

/// Read the primary document from `primary_path` and derive its secondary
/// document. The returned store is labelled with `secondary_path` but not
/// written.
pub fn derive_variant_file(
	primary_path: &Path,
	secondary_path: &Path,
	config: &TechsyncConfig,
) -> TechsyncResult<LineStore> {
	let primary = LineStore::load(primary_path).map_err(|e| {
		TechsyncError::Derivation {
			path: primary_path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut secondary = derive_secondary(&primary, config)?;
	secondary.set_label(secondary_path.display().to_string());

	Ok(secondary)
}
