use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::TechsyncError;
use crate::TechsyncResult;

/// Minimum length of a long description, in characters.
pub const DESCRIPTION_MIN_CHARS: usize = 50;
/// Maximum length of a long description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 100;
/// Maximum length of a short label, in characters.
pub const SHORT_LABEL_MAX_CHARS: usize = 40;

/// Operating systems a technique runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSet {
	pub linux: bool,
	pub windows: bool,
	pub macos: bool,
}

impl PlatformSet {
	pub const ALL: Self = Self {
		linux: true,
		windows: true,
		macos: true,
	};

	pub fn is_all(self) -> bool {
		self == Self::ALL
	}

	pub fn is_empty(self) -> bool {
		self == Self::default()
	}

	/// Number of supported platforms.
	pub fn count(self) -> usize {
		usize::from(self.linux) + usize::from(self.windows) + usize::from(self.macos)
	}

	/// Display names in a fixed order.
	pub fn names(self) -> Vec<&'static str> {
		let mut names = Vec::new();
		if self.linux {
			names.push("Linux");
		}
		if self.windows {
			names.push("Windows");
		}
		if self.macos {
			names.push("macOS");
		}
		names
	}

	/// Glyphs used in the documentation table.
	pub fn glyphs(self) -> String {
		let mut glyphs = String::new();
		if self.linux {
			glyphs.push('🐧');
		}
		if self.windows {
			glyphs.push('🪟');
		}
		if self.macos {
			glyphs.push('🍏');
		}
		glyphs
	}

	/// Enable the platform named `name`. Returns `false` for unknown names.
	pub fn enable(&mut self, name: &str) -> bool {
		match name.trim().to_ascii_lowercase().as_str() {
			"linux" => self.linux = true,
			"windows" | "win" => self.windows = true,
			"macos" | "mac" | "apple" => self.macos = true,
			"all" | "cross-platform" => *self = Self::ALL,
			_ => return false,
		}
		true
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseClass {
	#[default]
	Unrestricted,
	/// Only distributable under the primary document's copyleft license.
	Restricted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bitness {
	#[default]
	#[serde(rename = "any")]
	Any,
	#[serde(rename = "32-bit-only")]
	Only32Bit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
	#[default]
	#[serde(rename = "any")]
	Any,
	#[serde(rename = "x86-only")]
	X86Only,
}

/// One catalog record describing a detection technique.
///
/// `identifier` is the primary key across every document. `source_line` and
/// `generated_link` are cached positions derived from the primary document
/// and are refreshed rather than trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
	pub identifier: String,
	/// Name of the function implementing the technique.
	pub implementation_reference: String,
	/// Raw code injected verbatim into the primary document.
	pub implementation_body: String,
	pub platforms: PlatformSet,
	/// Certainty score in `0..=100`.
	pub score: u8,
	pub short_label: String,
	pub long_description: String,
	pub author: Option<String>,
	pub source_link: Option<String>,
	pub requires_admin: bool,
	pub license: LicenseClass,
	pub bitness: Bitness,
	pub architecture: Architecture,
	pub notes: Option<String>,
	/// 1-based line of the implementation in the primary document.
	pub source_line: Option<usize>,
	pub generated_link: Option<String>,
}

impl Entry {
	pub fn is_restricted(&self) -> bool {
		self.license == LicenseClass::Restricted
	}

	/// The `@category` tokens for the metadata block.
	pub fn categories(&self) -> Vec<&'static str> {
		let mut categories = self.platforms.names();
		if self.architecture == Architecture::X86Only {
			categories.push("x86");
		}
		if self.bitness == Bitness::Only32Bit {
			categories.push("32-bit");
		}
		categories
	}

	/// Apply `@category` tokens read back from a metadata block.
	pub fn apply_categories(&mut self, categories: &str) {
		for token in categories.split(',').map(str::trim) {
			match token {
				"x86" => self.architecture = Architecture::X86Only,
				"32-bit" => self.bitness = Bitness::Only32Bit,
				other => {
					self.platforms.enable(other);
				}
			}
		}
	}
}

impl fmt::Display for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({}%)", self.identifier, self.score)
	}
}

/// Unvalidated entry metadata, as typed at the prompt or read from an entry
/// file.
///
/// ```toml
/// identifier = "HYPERVISOR_STR"
/// implementation_file = "hypervisor_str.cpp"
/// cross_platform = true
/// score = 90
/// description = "Checks the CPUID hypervisor brand string for known VM vendor signatures"
/// short_label = "CPUID brand string"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntryDraft {
	pub identifier: String,
	/// Function name; derived from the identifier when empty.
	pub function: String,
	/// Path of the `.cpp` file holding the implementation.
	pub implementation_file: Option<PathBuf>,
	/// Implementation code, when not read from `implementation_file`.
	pub implementation_body: Option<String>,
	pub cross_platform: bool,
	pub platforms: Vec<String>,
	pub score: Option<i64>,
	pub description: String,
	pub short_label: String,
	pub author: String,
	pub source_link: String,
	pub admin: bool,
	pub restricted: bool,
	pub only_32_bit: bool,
	pub x86_only: bool,
	pub notes: String,
}

impl EntryDraft {
	/// Parse a draft from the TOML of an entry file.
	pub fn from_toml(content: &str) -> TechsyncResult<Self> {
		toml::from_str(content).map_err(|e| TechsyncError::ConfigParse(e.to_string()))
	}

	/// Read `implementation_file` (relative to `base`) into
	/// `implementation_body` unless a body is already present.
	pub fn load_implementation(&mut self, base: &Path) -> TechsyncResult<()> {
		if self.implementation_body.is_some() {
			return Ok(());
		}

		let Some(file) = &self.implementation_file else {
			return Err(TechsyncError::input(
				"implementation_file",
				"an implementation file or body is required",
			));
		};

		validate_implementation_path(file)?;
		let path = base.join(file);
		let body = std::fs::read_to_string(&path).map_err(|e| {
			TechsyncError::input(
				"implementation_file",
				format!("cannot read `{}`: {e}", path.display()),
			)
		})?;
		self.implementation_body = Some(body);

		Ok(())
	}

	/// Validate every field and build the [`Entry`].
	pub fn validate(self) -> TechsyncResult<Entry> {
		let identifier = validate_identifier(&self.identifier)?;
		let implementation_reference = validate_function_name(&self.function, &identifier)?;
		let implementation_body =
			validate_implementation_body(self.implementation_body.as_deref().unwrap_or_default())?;
		let platforms = validate_platforms(self.cross_platform, &self.platforms)?;
		let score = match self.score {
			Some(score) => validate_score_value(score)?,
			None => return Err(TechsyncError::MissingScore),
		};
		let long_description = validate_description(&self.description)?;
		let short_label = validate_short_label(&self.short_label, &long_description)?;

		Ok(Entry {
			identifier,
			implementation_reference,
			implementation_body,
			platforms,
			score,
			short_label,
			long_description,
			author: optional(&self.author),
			source_link: optional(&self.source_link),
			requires_admin: self.admin,
			license: if self.restricted {
				LicenseClass::Restricted
			} else {
				LicenseClass::Unrestricted
			},
			bitness: if self.only_32_bit {
				Bitness::Only32Bit
			} else {
				Bitness::Any
			},
			architecture: if self.x86_only {
				Architecture::X86Only
			} else {
				Architecture::Any
			},
			notes: optional(&self.notes),
			source_line: None,
			generated_link: None,
		})
	}
}

/// Normalize an identifier to upper case and check its characters.
pub fn validate_identifier(value: &str) -> TechsyncResult<String> {
	let identifier = value.trim().to_ascii_uppercase();
	if identifier.is_empty() {
		return Err(TechsyncError::input("identifier", "must not be empty"));
	}

	if !identifier
		.chars()
		.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
	{
		return Err(TechsyncError::input(
			"identifier",
			"only letters, digits and underscores are allowed",
		));
	}

	Ok(identifier)
}

/// Normalize a function name. Parentheses are dropped and the name is
/// lower-cased; an empty name falls back to the lower-cased identifier.
pub fn validate_function_name(value: &str, identifier: &str) -> TechsyncResult<String> {
	let name: String = value
		.trim()
		.chars()
		.filter(|c| *c != '(' && *c != ')')
		.collect::<String>()
		.to_lowercase();

	if name.is_empty() {
		return Ok(identifier.to_lowercase());
	}

	let mut chars = name.chars();
	let valid_start = chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
	if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(TechsyncError::input(
			"function",
			format!("`{name}` is not a valid function name"),
		));
	}

	Ok(name)
}

/// Parse a certainty score typed by the user. An empty answer is
/// [`TechsyncError::MissingScore`], which is not an input validation error
/// and so is never asked again.
pub fn validate_score(value: &str) -> TechsyncResult<u8> {
	let value = value.trim();
	if value.is_empty() {
		return Err(TechsyncError::MissingScore);
	}

	let score: i64 = value
		.parse()
		.map_err(|_| TechsyncError::input("score", format!("`{value}` is not an integer")))?;
	validate_score_value(score)
}

pub fn validate_score_value(score: i64) -> TechsyncResult<u8> {
	u8::try_from(score)
		.ok()
		.filter(|score| *score <= 100)
		.ok_or_else(|| TechsyncError::input("score", format!("{score} is outside 0 to 100")))
}

pub fn validate_description(value: &str) -> TechsyncResult<String> {
	let description = value.trim();
	let len = description.chars().count();

	if len < DESCRIPTION_MIN_CHARS {
		return Err(TechsyncError::input(
			"description",
			format!("too short ({len} characters, minimum {DESCRIPTION_MIN_CHARS})"),
		));
	}

	if len > DESCRIPTION_MAX_CHARS {
		return Err(TechsyncError::input(
			"description",
			format!("too long ({len} characters, maximum {DESCRIPTION_MAX_CHARS})"),
		));
	}

	Ok(description.to_string())
}

/// A short label must fit the budget and may not be longer than the long
/// description it summarizes.
pub fn validate_short_label(value: &str, description: &str) -> TechsyncResult<String> {
	let label = value.trim();
	let len = label.chars().count();

	if len == 0 {
		return Err(TechsyncError::input("short_label", "must not be empty"));
	}

	if len > SHORT_LABEL_MAX_CHARS {
		return Err(TechsyncError::input(
			"short_label",
			format!("too long ({len} characters, maximum {SHORT_LABEL_MAX_CHARS})"),
		));
	}

	if len > description.trim().chars().count() {
		return Err(TechsyncError::input(
			"short_label",
			"must not be longer than the description",
		));
	}

	Ok(label.to_string())
}

/// Cross-platform entries support everything; otherwise at least one
/// platform must be selected.
pub fn validate_platforms(cross_platform: bool, names: &[String]) -> TechsyncResult<PlatformSet> {
	if cross_platform {
		return Ok(PlatformSet::ALL);
	}

	let mut platforms = PlatformSet::default();
	for name in names {
		if !platforms.enable(name) {
			return Err(TechsyncError::input(
				"platforms",
				format!("unknown platform `{name}` (expected linux, windows or macos)"),
			));
		}
	}

	if platforms.is_empty() {
		return Err(TechsyncError::input("platforms", "select at least one platform"));
	}

	Ok(platforms)
}

/// The implementation is copied verbatim into the primary document, so it
/// must not pull in headers of its own.
pub fn validate_implementation_body(body: &str) -> TechsyncResult<String> {
	if body.trim().is_empty() {
		return Err(TechsyncError::input("implementation", "must not be empty"));
	}

	if body.to_lowercase().contains("#include") {
		return Err(TechsyncError::input(
			"implementation",
			"do not use #include, the code is copied verbatim into the header",
		));
	}

	Ok(body.trim_end().to_string())
}

pub fn validate_implementation_path(path: &Path) -> TechsyncResult<()> {
	match path.extension().and_then(|ext| ext.to_str()) {
		Some("cpp" | "cc") => Ok(()),
		_ => Err(TechsyncError::input(
			"implementation_file",
			format!("`{}` must be a .cpp or .cc file", path.display()),
		)),
	}
}

/// Empty input means "not provided".
pub fn optional(value: &str) -> Option<String> {
	let value = value.trim();
	(!value.is_empty()).then(|| value.to_string())
}
