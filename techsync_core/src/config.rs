use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::TechsyncError;
use crate::TechsyncResult;
use crate::render;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"techsync.toml",
	".techsync.toml",
	".config/techsync.toml",
];

/// Configuration loaded from a `techsync.toml` file.
///
/// Every section is optional and defaults to the VMAware repository layout,
/// so an empty file (or no file at all) is a valid configuration.
///
/// ```toml
/// namespace = "VM"
///
/// [documents]
/// primary = "src/vmaware.hpp"
/// secondary = "src/vmaware_MIT.hpp"
/// cli = "src/cli.cpp"
/// docs = "docs/documentation.md"
///
/// [check]
/// allow = ["ANYRUN_DIRECTORY", "ANYRUN_DRIVER"]
///
/// [links]
/// base = "https://github.com/kernelwernel/VMAware/tree/main/src/vmaware.hpp"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TechsyncConfig {
	/// The identifier namespace, `VM` in `VM::HYPERVISOR_STR`.
	pub namespace: String,
	/// Paths of the synchronized documents, relative to the project root.
	pub documents: DocumentsConfig,
	/// Literal marker lines used as insertion points.
	pub anchors: AnchorsConfig,
	/// Bounds and filters of the technique table in the primary document.
	pub table: TableConfig,
	/// Bounds of the flag table in the documentation.
	pub docs_table: DocsTableConfig,
	/// Companion CLI conventions.
	pub cli: CliConfig,
	/// Restriction tag and license substitution for the derived variant.
	pub license: LicenseConfig,
	/// Structural sections reported in the `SECTIONS` banner.
	pub sections: SectionsConfig,
	/// Version/date banner line.
	pub version: VersionConfig,
	/// Generated source links.
	pub links: LinksConfig,
	/// Consistency checker settings.
	pub check: CheckConfig,
	/// Rendering templates for every insertion point.
	pub templates: TemplatesConfig,
}

impl Default for TechsyncConfig {
	fn default() -> Self {
		Self {
			namespace: "VM".to_string(),
			documents: DocumentsConfig::default(),
			anchors: AnchorsConfig::default(),
			table: TableConfig::default(),
			docs_table: DocsTableConfig::default(),
			cli: CliConfig::default(),
			license: LicenseConfig::default(),
			sections: SectionsConfig::default(),
			version: VersionConfig::default(),
			links: LinksConfig::default(),
			check: CheckConfig::default(),
			templates: TemplatesConfig::default(),
		}
	}
}

impl TechsyncConfig {
	/// Resolve the highest-precedence config file path at `root`, if any.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> TechsyncResult<Option<TechsyncConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to the defaults when no file is
	/// present.
	pub fn load_or_default(root: &Path) -> TechsyncResult<TechsyncConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	/// Parse a config from TOML text.
	pub fn from_toml(content: &str) -> TechsyncResult<TechsyncConfig> {
		toml::from_str(content).map_err(|e| TechsyncError::ConfigParse(e.to_string()))
	}

	/// The namespace prefix as it appears in documents, e.g. `VM::`.
	pub fn namespace_prefix(&self) -> String {
		format!("{}::", self.namespace)
	}
}

/// Paths of the synchronized documents.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
	/// The dual-licensed header. Authoritative for the identifier set.
	pub primary: PathBuf,
	/// The license variant derived from the primary.
	pub secondary: PathBuf,
	/// The companion CLI source.
	pub cli: PathBuf,
	/// The markdown documentation holding the flag table.
	pub docs: PathBuf,
}

impl Default for DocumentsConfig {
	fn default() -> Self {
		Self {
			primary: PathBuf::from("src/vmaware.hpp"),
			secondary: PathBuf::from("src/vmaware_MIT.hpp"),
			cli: PathBuf::from("src/cli.cpp"),
			docs: PathBuf::from("docs/documentation.md"),
		}
	}
}

/// Marker lines new entries are spliced after.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnchorsConfig {
	pub enum_slot: String,
	pub implementation_slot: String,
	pub table_slot: String,
	pub string_case_slot: String,
	pub checker_slot: String,
	pub linux_slot: String,
	pub windows_slot: String,
	pub macos_slot: String,
	pub docs_row_slot: String,
}

impl Default for AnchorsConfig {
	fn default() -> Self {
		Self {
			enum_slot: "// ADD NEW TECHNIQUE ENUM NAME HERE".to_string(),
			implementation_slot: "// ADD NEW TECHNIQUE FUNCTION HERE".to_string(),
			table_slot: "// ADD NEW TECHNIQUE STRUCTURE TO TABLE HERE".to_string(),
			string_case_slot: "// ADD NEW CASE HERE FOR NEW TECHNIQUE".to_string(),
			checker_slot: "// ADD NEW TECHNIQUE CHECKER HERE".to_string(),
			linux_slot: "// ADD LINUX FLAG".to_string(),
			windows_slot: "// ADD WINDOWS FLAG".to_string(),
			macos_slot: "// ADD MACOS FLAG".to_string(),
			docs_row_slot: "<!-- ADD TECHNIQUE DETAILS HERE -->".to_string(),
		}
	}
}

/// The technique table at the end of the primary document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
	pub start: String,
	pub end: String,
	/// Lines containing any of these are metadata wrappers, not entries.
	pub wrappers: Vec<String>,
}

impl Default for TableConfig {
	fn default() -> Self {
		Self {
			start: "// START OF TECHNIQUE TABLE".to_string(),
			end: "// END OF TECHNIQUE TABLE".to_string(),
			wrappers: vec![
				"VM::core::custom_technique".to_string(),
				"VM::core::technique".to_string(),
			],
		}
	}
}

/// The flag table in the documentation, bounded by two headings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsTableConfig {
	pub start: String,
	pub end: String,
}

impl Default for DocsTableConfig {
	fn default() -> Self {
		Self {
			start: "# Flag table".to_string(),
			end: "# Setting flags".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
	/// The checklist call whose first argument is the identifier.
	pub call: String,
}

impl Default for CliConfig {
	fn default() -> Self {
		Self {
			call: "checker(".to_string(),
		}
	}
}

/// Restriction tag and license block substitution for the derived variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
	/// Lines carrying this tag are dropped from the derived variant.
	pub tag: String,
	/// The license declaration line of the primary document.
	pub marker: String,
	/// The block substituted for the license declaration line.
	pub replacement: String,
}

impl Default for LicenseConfig {
	fn default() -> Self {
		Self {
			tag: "/* GPL */".to_string(),
			marker: " *  - License: GPL-3.0 (https://www.gnu.org/licenses/gpl-3.0.html)".to_string(),
			replacement: DEFAULT_LICENSE_REPLACEMENT.join("\n"),
		}
	}
}

/// The MIT block written in place of the license line. Blank comment lines
/// carry trailing spaces.
pub const DEFAULT_LICENSE_REPLACEMENT: &[&str] = &[
	" *  - License: MIT",
	" * ",
	" *                               MIT License",
	" *  ",
	" *  Copyright (c) 2024 kernelwernel",
	" *  ",
	" *  Permission is hereby granted, free of charge, to any person obtaining a copy",
	" *  of this software and associated documentation files (the \"Software\"), to deal",
	" *  in the Software without restriction, including without limitation the rights",
	" *  to use, copy, modify, merge, publish, distribute, sublicense, and/or sell",
	" *  copies of the Software, and to permit persons to whom the Software is",
	" *  furnished to do so, subject to the following conditions:",
	" *  ",
	" *  The above copyright notice and this permission notice shall be included in all",
	" *  copies or substantial portions of the Software.",
	" *  ",
	" *  THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR",
	" *  IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,",
	" *  FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE",
	" *  AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER",
	" *  LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,",
	" *  OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE",
	" *  SOFTWARE.",
];

/// One structural region listed in the `SECTIONS` banner.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SectionSpec {
	/// Text identifying the first line of the region.
	pub marker: String,
	/// Human-readable description printed in the banner.
	pub label: String,
}

impl SectionSpec {
	fn new(marker: &str, label: &str) -> Self {
		Self {
			marker: marker.to_string(),
			label: label.to_string(),
		}
	}
}

/// Configuration of the `SECTIONS` banner.
///
/// ```toml
/// [sections]
/// heading = "= SECTIONS ="
/// banner_swap = [4, 5]
/// line_base = 1
///
/// [[sections.regions]]
/// marker = "enum enum_flags"
/// label = "enums for publicly accessible techniques"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
	/// Text of the heading line directly above the banner.
	pub heading: String,
	/// Prefix of every banner line.
	pub line_prefix: String,
	/// Regions in the order they appear in the document.
	pub regions: Vec<SectionSpec>,
	/// Zero-based banner lines exchanged after the numbers are filled in.
	pub banner_swap: Option<[usize; 2]>,
	/// Number given to the first line of the document in the banner. Set to
	/// `0` to keep banners written with zero-based line numbers.
	pub line_base: usize,
}

impl Default for SectionsConfig {
	fn default() -> Self {
		Self {
			heading: "= SECTIONS =".to_string(),
			line_prefix: " * - ".to_string(),
			regions: vec![
				SectionSpec::new("enum enum_flags", "enums for publicly accessible techniques"),
				SectionSpec::new("struct cpu {", "struct for internal cpu operations"),
				SectionSpec::new("struct memo {", "struct for internal memoization"),
				SectionSpec::new("struct util {", "struct for internal utility functions"),
				SectionSpec::new(
					"private: // START OF PRIVATE VM DETECTION TECHNIQUE DEFINITIONS",
					"start of VM detection technique list",
				),
				SectionSpec::new("struct core {", "struct for internal core components"),
				SectionSpec::new(
					"public: // START OF PUBLIC FUNCTIONS",
					"start of public VM detection functions",
				),
				SectionSpec::new(
					"// ============= EXTERNAL DEFINITIONS =============",
					"start of externally defined variables",
				),
			],
			banner_swap: Some([4, 5]),
			line_base: 1,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
	/// Decorative text identifying the version line. The rewritten line is
	/// this text followed by `<version> (<Month> <Year>)`.
	pub banner: String,
}

impl Default for VersionConfig {
	fn default() -> Self {
		Self {
			banner: " *   ╚═══╝  ╚═╝     ╚═╝╚═╝  ╚═╝ ╚══╝╚══╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝ ".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
	/// URL of the primary document; links append `#L<line>`.
	pub base: String,
}

impl Default for LinksConfig {
	fn default() -> Self {
		Self {
			base: "https://github.com/kernelwernel/VMAware/tree/main/src/vmaware.hpp".to_string(),
		}
	}
}

impl LinksConfig {
	/// The link to a 1-based line of the primary document.
	pub fn link_to(&self, line: usize) -> String {
		format!("{}#L{line}", self.base)
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
	/// Legacy identifiers known to exist in only some documents.
	pub allow: Vec<String>,
}

impl Default for CheckConfig {
	fn default() -> Self {
		Self {
			allow: vec!["ANYRUN_DIRECTORY".to_string(), "ANYRUN_DRIVER".to_string()],
		}
	}
}

/// `minijinja` templates for each insertion point. The entry is available
/// as `entry`, the namespace as `ns`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
	pub enum_slot: String,
	pub implementation_slot: String,
	pub restricted_implementation_slot: String,
	pub table_slot: String,
	pub string_case_slot: String,
	pub checker_slot: String,
	pub platform_slot: String,
	pub docs_row_slot: String,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		Self {
			enum_slot: render::ENUM_TEMPLATE.to_string(),
			implementation_slot: render::IMPLEMENTATION_TEMPLATE.to_string(),
			restricted_implementation_slot: render::RESTRICTED_IMPLEMENTATION_TEMPLATE.to_string(),
			table_slot: render::TABLE_TEMPLATE.to_string(),
			string_case_slot: render::STRING_CASE_TEMPLATE.to_string(),
			checker_slot: render::CHECKER_TEMPLATE.to_string(),
			platform_slot: render::PLATFORM_TEMPLATE.to_string(),
			docs_row_slot: render::DOCS_ROW_TEMPLATE.to_string(),
		}
	}
}
