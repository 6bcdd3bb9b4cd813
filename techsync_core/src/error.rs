use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TechsyncError {
	#[error(transparent)]
	#[diagnostic(code(techsync::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid value for `{field}`: {reason}")]
	#[diagnostic(code(techsync::input_validation))]
	InputValidation { field: String, reason: String },

	#[error("a score is mandatory (0 to 100)")]
	#[diagnostic(
		code(techsync::missing_score),
		help("every technique needs a certainty score between 0 and 100")
	)]
	MissingScore,

	#[error("anchor `{marker}` not found in {document}")]
	#[diagnostic(
		code(techsync::missing_anchor),
		help("restore the marker line or update the `[anchors]` section of techsync.toml")
	)]
	MissingAnchor { document: String, marker: String },

	#[error("anchor `{marker}` appears {count} times in {document}, expected exactly once")]
	#[diagnostic(
		code(techsync::duplicate_anchor),
		help("remove the extra copies so the insertion point is unambiguous")
	)]
	DuplicateAnchor {
		document: String,
		marker: String,
		count: usize,
	},

	#[error("region `{start}`..`{end}` in {document} is empty or reversed")]
	#[diagnostic(code(techsync::invalid_range))]
	InvalidRange {
		document: String,
		start: String,
		end: String,
	},

	#[error("line {line} is out of range for {document} ({len} lines)")]
	#[diagnostic(code(techsync::line_out_of_range))]
	LineOutOfRange {
		document: String,
		line: usize,
		len: usize,
	},

	#[error("{document} received {realized} update(s), expected {expected}")]
	#[diagnostic(
		code(techsync::update_count_mismatch),
		help("an anchor was renamed or a template rendered nothing; no file was written")
	)]
	UpdateCountMismatch {
		document: String,
		expected: usize,
		realized: usize,
	},

	#[error("identifier `{0}` already exists in the technique table")]
	#[diagnostic(
		code(techsync::duplicate_identifier),
		help("identifiers are primary keys and must be unique across the catalog")
	)]
	DuplicateIdentifier(String),

	#[error("unable to find an identifier on line {line} of {document}: `{text}`")]
	#[diagnostic(
		code(techsync::extraction),
		help("every entry line must reference exactly one identifier")
	)]
	Extraction {
		document: String,
		line: usize,
		text: String,
	},

	#[error("{count} identifier(s) differ between documents")]
	#[diagnostic(
		code(techsync::inconsistent),
		help("add the technique to every document, or list it under `[check] allow`")
	)]
	Inconsistent { count: usize },

	#[error("failed to derive license variant from `{path}`: {reason}")]
	#[diagnostic(code(techsync::derivation))]
	Derivation { path: String, reason: String },

	#[error("no `{heading}` heading found in {document}")]
	#[diagnostic(code(techsync::missing_sections_heading))]
	MissingSectionsHeading { document: String, heading: String },

	#[error("banner swap `[{first}, {second}]` does not name two adjacent banner lines")]
	#[diagnostic(code(techsync::invalid_banner_swap))]
	InvalidBannerSwap { first: usize, second: usize },

	#[error("version number not found in `{0}`")]
	#[diagnostic(
		code(techsync::malformed_version),
		help("versions use the `MAJOR.MINOR` form, e.g. `2.1`")
	)]
	MalformedVersion(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(techsync::config_parse),
		help("check that techsync.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("template `{name}` failed to render: {reason}")]
	#[diagnostic(code(techsync::template_render))]
	TemplateRender { name: String, reason: String },
}

impl TechsyncError {
	/// Shorthand for an [`TechsyncError::InputValidation`] error.
	pub fn input(field: &str, reason: impl Into<String>) -> Self {
		Self::InputValidation {
			field: field.to_string(),
			reason: reason.into(),
		}
	}

	/// Whether the error came from a single bad input field and can be
	/// resolved by asking for that field again.
	pub fn is_input_validation(&self) -> bool {
		matches!(self, Self::InputValidation { .. })
	}
}

pub type TechsyncResult<T> = Result<T, TechsyncError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
