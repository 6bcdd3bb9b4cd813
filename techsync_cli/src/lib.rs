use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

pub use prompt::*;

mod prompt;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep the VMAware technique catalog synchronized across every document that lists it.",
	long_about = "techsync keeps the technique catalog of the VMAware library consistent across \
	              the dual-licensed header, its MIT-only variant, the CLI source and the markdown \
	              documentation.\n\nEvery technique must appear in every document exactly \
	              once. Adding a technique patches all of them at their anchor comments, and the \
	              refresh path recomputes the line references that edits invalidate.\n\nQuick \
	              start:\n  techsync init     Create a sample techsync.toml\n  techsync add      \
	              Add a technique to every document\n  techsync check    Verify the documents \
	              agree\n  techsync update   Refresh banners, versions and source links"
)]
pub struct TechsyncCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the repository root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `techsync.toml` in the repository root.
	///
	/// The sample lists every configuration section with its default value
	/// commented out. If a configuration file already exists this command is
	/// a no-op and exits successfully.
	Init,
	/// Add a new technique to the primary header, the CLI and the docs.
	///
	/// Without `--entry` the technique is described interactively and every
	/// invalid answer is asked again. With `--entry` the description is read
	/// from a TOML file and any invalid field is fatal.
	///
	/// All documents are patched in memory first; nothing is written unless
	/// every anchor resolved and received the expected number of updates.
	/// The MIT variant of the header is regenerated afterwards.
	Add {
		/// TOML file describing the technique. Relative implementation
		/// files are resolved against the directory of this file.
		#[arg(long)]
		entry: Option<PathBuf>,

		/// Do not regenerate the MIT variant after adding the technique.
		#[arg(long, default_value_t = false)]
		no_derive: bool,
	},
	/// Check that every document lists the same techniques.
	///
	/// The technique table of the primary header is authoritative. The CLI
	/// checklist and the documentation table are compared against it, and
	/// any technique missing on either side is reported. Exits with status 1
	/// when the documents disagree.
	///
	/// Ideal as a CI acceptance gate. Use `--format` to control the output
	/// style.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Regenerate the MIT variant of the primary header.
	///
	/// Every line carrying the GPL tag is dropped and the license line is
	/// replaced with the MIT license block.
	Derive {
		/// Only report whether the variant is up to date. Exits with status 1
		/// when it is stale.
		#[arg(long, default_value_t = false)]
		check: bool,

		/// Show a unified diff between the current and regenerated variant.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Recompute the SECTIONS banner of the primary header and its variant.
	Sections {
		/// Print the recomputed banner without writing files.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Run the full refresh: check, derive, sections, version banner and
	/// documentation source links.
	///
	/// The consistency check runs first and aborts the refresh when the
	/// documents disagree.
	Update {
		/// New version number, e.g. `2.1`. Defaults to the version already in
		/// the header banner. The release date is always set to today.
		#[arg(value_name = "VERSION")]
		release: Option<String>,

		/// Preview changes without writing files.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// List the techniques harvested from the primary header.
	List {
		/// Output format for list results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = ListOutputFormat::Text)]
		format: ListOutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
	/// GitHub Actions annotation format.
	Github,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListOutputFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
