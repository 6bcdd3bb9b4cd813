use minijinja::Environment;
use serde::Serialize;

use crate::Architecture;
use crate::Bitness;
use crate::Entry;
use crate::TechsyncConfig;
use crate::TechsyncError;
use crate::TechsyncResult;

pub const ENUM_TEMPLATE: &str = "{{ entry.identifier }},";

pub const IMPLEMENTATION_TEMPLATE: &str = "/**
 * @brief {{ entry.long_description }}
 * @category {{ categories }}
{%- if entry.author %}
 * @author {{ entry.author }}
{%- endif %}
{%- if entry.source_link %}
 * @link {{ entry.source_link }}
{%- endif %}
{%- if entry.notes %}
 * @note {{ entry.notes }}
{%- endif %}
{%- if entry.requires_admin %}
 * @warning Requires administrative privileges
{%- endif %}
 * @implements {{ qualified }}
 */
{{ entry.implementation_body }}";

pub const RESTRICTED_IMPLEMENTATION_TEMPLATE: &str = "// @brief {{ entry.long_description }}
// @category {{ categories }}
{%- if entry.author %}
// @author {{ entry.author }}
{%- endif %}
{%- if entry.source_link %}
// @link {{ entry.source_link }}
{%- endif %}
{%- if entry.notes %}
// @note {{ entry.notes }}
{%- endif %}
{%- if entry.requires_admin %}
// @warning Requires administrative privileges
{%- endif %}
// @implements {{ qualified }}
{{ entry.implementation_body }}";

pub const TABLE_TEMPLATE: &str =
	"{ {{ qualified }}, { {{ entry.score }}, {{ ns }}::{{ entry.implementation_reference }} } },";

pub const STRING_CASE_TEMPLATE: &str =
	"case {{ entry.identifier }}: return \"{{ entry.identifier }}\";";

pub const CHECKER_TEMPLATE: &str = "checker({{ qualified }}, \"{{ entry.short_label }}\");";

pub const PLATFORM_TEMPLATE: &str = "case {{ qualified }}:";

pub const DOCS_ROW_TEMPLATE: &str = "| `{{ qualified }}` | {{ entry.long_description }} | {{ \
                                     glyphs }} | {{ entry.score }}% | {% if entry.requires_admin \
                                     %}Yes{% endif %} | {% if restricted %}GPL{% endif %} | {% if \
                                     only_32_bit %}Yes{% endif %} | {% if entry.notes %}{{ \
                                     entry.notes }}{% endif %} | {% if link %}[link]({{ link }}){% \
                                     endif %} |";

/// The insertion points a rendered entry can be placed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
	Enum,
	Implementation,
	Table,
	StringCase,
	Checker,
	Linux,
	Windows,
	MacOs,
	DocsRow,
}

impl Slot {
	/// Template name for the slot, given whether the entry is restricted.
	fn template_name(self, restricted: bool) -> &'static str {
		match self {
			Self::Enum => "enum_slot",
			Self::Implementation if restricted => "restricted_implementation_slot",
			Self::Implementation => "implementation_slot",
			Self::Table => "table_slot",
			Self::StringCase => "string_case_slot",
			Self::Checker => "checker_slot",
			Self::Linux | Self::Windows | Self::MacOs => "platform_slot",
			Self::DocsRow => "docs_row_slot",
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Enum => "enum",
			Self::Implementation => "implementation",
			Self::Table => "table",
			Self::StringCase => "string case",
			Self::Checker => "checklist",
			Self::Linux => "linux case",
			Self::Windows => "windows case",
			Self::MacOs => "macos case",
			Self::DocsRow => "docs row",
		}
	}
}

#[derive(Serialize)]
struct RenderContext<'a> {
	ns: &'a str,
	entry: &'a Entry,
	qualified: String,
	categories: String,
	glyphs: String,
	restricted: bool,
	only_32_bit: bool,
	x86_only: bool,
	link: &'a str,
}

/// Renders entries through the configured `minijinja` templates.
pub struct Renderer<'a> {
	env: Environment<'a>,
	namespace: &'a str,
}

impl<'a> Renderer<'a> {
	pub fn new(config: &'a TechsyncConfig) -> TechsyncResult<Self> {
		let templates = &config.templates;
		let mut env = Environment::new();
		env.set_keep_trailing_newline(false);

		for (name, source) in [
			("enum_slot", templates.enum_slot.as_str()),
			("implementation_slot", templates.implementation_slot.as_str()),
			(
				"restricted_implementation_slot",
				templates.restricted_implementation_slot.as_str(),
			),
			("table_slot", templates.table_slot.as_str()),
			("string_case_slot", templates.string_case_slot.as_str()),
			("checker_slot", templates.checker_slot.as_str()),
			("platform_slot", templates.platform_slot.as_str()),
			("docs_row_slot", templates.docs_row_slot.as_str()),
		] {
			env.add_template(name, source)
				.map_err(|e| render_error(name, &e))?;
		}

		Ok(Self {
			env,
			namespace: &config.namespace,
		})
	}

	/// Render `entry` for `slot` as a list of unindented lines.
	pub fn render(&self, slot: Slot, entry: &Entry) -> TechsyncResult<Vec<String>> {
		let name = slot.template_name(entry.is_restricted());
		let template = self
			.env
			.get_template(name)
			.map_err(|e| render_error(name, &e))?;

		let ctx = RenderContext {
			ns: self.namespace,
			entry,
			qualified: format!("{}::{}", self.namespace, entry.identifier),
			categories: entry.categories().join(", "),
			glyphs: entry.platforms.glyphs(),
			restricted: entry.is_restricted(),
			only_32_bit: entry.bitness == Bitness::Only32Bit,
			x86_only: entry.architecture == Architecture::X86Only,
			link: entry.generated_link.as_deref().unwrap_or_default(),
		};

		let rendered = template
			.render(minijinja::Value::from_serialize(&ctx))
			.map_err(|e| render_error(name, &e))?;

		Ok(rendered.lines().map(str::to_string).collect())
	}
}

fn render_error(name: &str, error: &minijinja::Error) -> TechsyncError {
	TechsyncError::TemplateRender {
		name: name.to_string(),
		reason: error.to_string(),
	}
}
