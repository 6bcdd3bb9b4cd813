use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::LineStore;
use crate::TechsyncConfig;
use crate::TechsyncResult;

/// The role a document plays in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
	Primary,
	Secondary,
	Cli,
	Docs,
}

impl DocumentKind {
	/// The configured path of this document relative to the project root.
	pub fn path(self, config: &TechsyncConfig) -> &Path {
		let documents = &config.documents;
		match self {
			Self::Primary => &documents.primary,
			Self::Secondary => &documents.secondary,
			Self::Cli => &documents.cli,
			Self::Docs => &documents.docs,
		}
	}
}

impl fmt::Display for DocumentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Primary => "primary header",
			Self::Secondary => "license variant",
			Self::Cli => "cli",
			Self::Docs => "documentation",
		};
		f.write_str(name)
	}
}

/// A physical text artifact held in memory.
#[derive(Debug, Clone)]
pub struct Document {
	pub kind: DocumentKind,
	/// Absolute (root-joined) path of the file.
	pub path: PathBuf,
	pub lines: LineStore,
}

impl Document {
	/// Load the document of `kind` under `root`. The store is labelled with
	/// the configured relative path.
	pub fn load(root: &Path, config: &TechsyncConfig, kind: DocumentKind) -> TechsyncResult<Self> {
		let relative = kind.path(config);
		let path = root.join(relative);
		let mut lines = LineStore::load(&path)?;
		lines.set_label(relative.display().to_string());

		Ok(Self { kind, path, lines })
	}

	/// Write the document back atomically.
	pub fn save(&self) -> TechsyncResult<()> {
		self.lines.save(&self.path)
	}
}

/// The documents an entry is synchronized across.
#[derive(Debug, Clone)]
pub struct DocumentSet {
	pub primary: Document,
	pub cli: Document,
	pub docs: Document,
}

impl DocumentSet {
	pub fn load(root: &Path, config: &TechsyncConfig) -> TechsyncResult<Self> {
		Ok(Self {
			primary: Document::load(root, config, DocumentKind::Primary)?,
			cli: Document::load(root, config, DocumentKind::Cli)?,
			docs: Document::load(root, config, DocumentKind::Docs)?,
		})
	}

	/// Save every document. Each file is replaced atomically; there is no
	/// transaction spanning files.
	pub fn save(&self) -> TechsyncResult<()> {
		self.primary.save()?;
		self.cli.save()?;
		self.docs.save()
	}
}
