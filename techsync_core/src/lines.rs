use std::io::Write;
use std::path::Path;

use derive_more::Deref;

use crate::TechsyncError;
use crate::TechsyncResult;

/// An ordered, mutable sequence of whole lines read from a text artifact.
///
/// Lines are stored without terminators. The store remembers whether the
/// source used `\r\n` endings and whether it ended with a newline, so that
/// [`LineStore::save`] reproduces the original file geometry byte for byte
/// when nothing changed.
///
/// Read access goes through [`Deref`] to `Vec<String>`; every mutation
/// replaces, inserts or removes whole lines.
#[derive(Debug, Clone, Default, Deref)]
pub struct LineStore {
	#[deref]
	lines: Vec<String>,
	label: String,
	trailing_newline: bool,
	crlf: bool,
}

impl LineStore {
	/// Read the file at `path` fully into memory.
	pub fn load(path: &Path) -> TechsyncResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Ok(Self::from_text(path.display().to_string(), &content))
	}

	/// Build a store from in-memory text. `label` names the document in
	/// diagnostics.
	pub fn from_text(label: impl Into<String>, content: &str) -> Self {
		Self {
			lines: content.lines().map(str::to_string).collect(),
			label: label.into(),
			trailing_newline: content.ends_with('\n'),
			crlf: content.contains("\r\n"),
		}
	}

	/// Build a new store holding `lines` with the same label and line ending
	/// conventions as `self`.
	pub fn with_lines(&self, label: impl Into<String>, lines: Vec<String>) -> Self {
		Self {
			lines,
			label: label.into(),
			trailing_newline: self.trailing_newline,
			crlf: self.crlf,
		}
	}

	/// Name of the document in diagnostics.
	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn set_label(&mut self, label: impl Into<String>) {
		self.label = label.into();
	}

	/// Render the full document text.
	pub fn to_text(&self) -> String {
		let newline = if self.crlf { "\r\n" } else { "\n" };
		let mut text = self.lines.join(newline);
		if self.trailing_newline && !self.lines.is_empty() {
			text.push_str(newline);
		}
		text
	}

	/// The line at `index`.
	pub fn line(&self, index: usize) -> TechsyncResult<&str> {
		self.lines
			.get(index)
			.map(String::as_str)
			.ok_or_else(|| self.out_of_range(index))
	}

	/// Replace the line at `index`, returning the previous content.
	pub fn replace(&mut self, index: usize, line: impl Into<String>) -> TechsyncResult<String> {
		if index >= self.lines.len() {
			return Err(self.out_of_range(index));
		}

		Ok(std::mem::replace(&mut self.lines[index], line.into()))
	}

	/// Insert `lines` immediately after the line at `index`. Returns the number
	/// of inserted lines.
	pub fn splice_after(&mut self, index: usize, lines: Vec<String>) -> TechsyncResult<usize> {
		if index >= self.lines.len() {
			return Err(self.out_of_range(index));
		}

		self.insert(index + 1, lines)
	}

	/// Insert `lines` so that the first one ends up at `index`.
	pub fn insert(&mut self, index: usize, lines: Vec<String>) -> TechsyncResult<usize> {
		if index > self.lines.len() {
			return Err(self.out_of_range(index));
		}

		let count = lines.len();
		self.lines.splice(index..index, lines);
		Ok(count)
	}

	/// Remove and return the line at `index`.
	pub fn remove(&mut self, index: usize) -> TechsyncResult<String> {
		if index >= self.lines.len() {
			return Err(self.out_of_range(index));
		}

		Ok(self.lines.remove(index))
	}

	/// Overwrite `path` with the full sequence.
	///
	/// The content is written to a temporary file in the destination
	/// directory and renamed over the destination, so a failure never leaves
	/// a half-written file behind. Existing file permissions are kept.
	pub fn save(&self, path: &Path) -> TechsyncResult<()> {
		let dir = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};

		let mut file = tempfile::NamedTempFile::new_in(dir)?;
		file.write_all(self.to_text().as_bytes())?;
		file.flush()?;

		if let Ok(metadata) = std::fs::metadata(path) {
			file.as_file().set_permissions(metadata.permissions())?;
		}

		file.persist(path).map_err(|e| TechsyncError::Io(e.error))?;
		tracing::info!(path = %path.display(), lines = self.lines.len(), "wrote document");

		Ok(())
	}

	fn out_of_range(&self, index: usize) -> TechsyncError {
		TechsyncError::LineOutOfRange {
			document: self.label.clone(),
			line: index + 1,
			len: self.lines.len(),
		}
	}
}
