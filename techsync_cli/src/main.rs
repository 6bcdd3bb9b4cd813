use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use techsync_cli::Commands;
use techsync_cli::ListOutputFormat;
use techsync_cli::OutputFormat;
use techsync_cli::Prompter;
use techsync_cli::TechsyncCli;
use techsync_cli::collect_draft;
use techsync_core::CONFIG_FILE_CANDIDATES;
use techsync_core::ConsistencyReport;
use techsync_core::Document;
use techsync_core::DocumentKind;
use techsync_core::DocumentSet;
use techsync_core::EntryDraft;
use techsync_core::Extractor;
use techsync_core::LineStore;
use techsync_core::MismatchSide;
use techsync_core::Registry;
use techsync_core::Synchronizer;
use techsync_core::TechsyncConfig;
use techsync_core::TechsyncError;
use techsync_core::check_consistency;
use techsync_core::derive_secondary;
use techsync_core::derive_variant_file;
use techsync_core::recompute_sections;
use techsync_core::recompute_version;
use techsync_core::refresh_links;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TechsyncCli::parse();

	// Respect NO_COLOR, --no-color and terminals without color support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	setup_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Add { entry, no_derive }) => run_add(&args, entry.as_deref(), *no_derive),
		Some(Commands::Check { format }) => run_check(&args, *format),
		Some(Commands::Derive { check, diff }) => run_derive(&args, *check, *diff),
		Some(Commands::Sections { dry_run }) => run_sections(&args, *dry_run),
		Some(Commands::Update { release, dry_run }) => {
			run_update(&args, release.as_deref(), *dry_run)
		}
		Some(Commands::List { format }) => run_list(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `techsync --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<TechsyncError>() {
			Ok(techsync_err) => {
				let report: miette::Report = (*techsync_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn setup_tracing(verbose: bool, use_color: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init()
		.ok();
}

fn resolve_root(args: &TechsyncCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_config(root: &Path) -> Result<TechsyncConfig, Box<dyn std::error::Error>> {
	let config = TechsyncConfig::load_or_default(root)?;
	match TechsyncConfig::resolve_path(root) {
		Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
		None => tracing::debug!(root = %root.display(), "no config file, using defaults"),
	}

	Ok(config)
}

fn run_init(args: &TechsyncCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = TechsyncConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	let sample_config = "# techsync configuration\n# Every section is optional; the values below \
	                     are the defaults.\n\n# namespace = \"VM\"\n\n# [documents]\n# primary = \
	                     \"src/vmaware.hpp\"\n# secondary = \"src/vmaware_MIT.hpp\"\n# cli = \
	                     \"src/cli.cpp\"\n# docs = \"docs/documentation.md\"\n\n# Techniques that \
	                     are allowed to be missing from the CLI or the docs.\n# [check]\n# allow \
	                     = [\"ANYRUN_DIRECTORY\", \"ANYRUN_DRIVER\"]\n\n# Swap of two adjacent \
	                     SECTIONS banner lines (0-based), and the number of the\n# first document line \
	                     in the banner.\n# [sections]\n# banner_swap = [4, 5]\n# line_base = \
	                     1\n\n# [links]\n# base = \
	                     \"https://github.com/kernelwernel/VMAware/tree/main/src/vmaware.hpp\"\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Adjust the document paths if your layout differs");
	println!("  2. Run `techsync check` to verify the documents agree");
	println!("  3. Run `techsync add` to add a technique");

	Ok(())
}

fn run_add(
	args: &TechsyncCli,
	entry_file: Option<&Path>,
	no_derive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let mut documents = DocumentSet::load(&root, &config)?;

	let draft = match entry_file {
		Some(path) => {
			let mut draft = EntryDraft::from_toml(&std::fs::read_to_string(path)?)?;
			let base = path.parent().unwrap_or_else(|| Path::new("."));
			draft.load_implementation(base)?;
			draft
		}
		None => {
			let stdin = std::io::stdin();
			let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
			collect_draft(&mut prompter, &std::env::current_dir()?)?
		}
	};

	let mut entry = draft.validate()?;
	let synchronizer = Synchronizer::new(&config)?;
	let report = synchronizer.apply(&mut entry, &mut documents)?;

	println!(
		"{} {}{}",
		colored!("Added", green),
		config.namespace_prefix(),
		entry.identifier
	);
	for update in &report.updates {
		println!(
			"  {}: {} update(s), {} line(s)",
			update.kind.path(&config).display(),
			update.realized,
			update.inserted_lines
		);
	}
	if let Some(line) = report.source_line {
		println!("  implementation starts at line {line}");
	}

	if no_derive {
		return Ok(());
	}

	let secondary_path = root.join(&config.documents.secondary);
	let secondary = derive_secondary(&documents.primary.lines, &config)?;
	secondary.save(&secondary_path)?;
	println!("Derived {}", make_relative(&secondary_path, &root));

	Ok(())
}

#[derive(Serialize)]
struct CheckOutput<'a> {
	ok: bool,
	#[serde(flatten)]
	report: &'a ConsistencyReport,
}

fn run_check(args: &TechsyncCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let documents = DocumentSet::load(&root, &config)?;
	let report = check_consistency(
		&documents.primary.lines,
		&documents.cli.lines,
		&documents.docs.lines,
		&config,
	)?;

	match format {
		OutputFormat::Json => {
			let output = CheckOutput {
				ok: report.is_ok(),
				report: &report,
			};
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Github => {
			let prefix = config.namespace_prefix();
			for mismatch in &report.mismatches {
				let (kind, message) = match mismatch.side {
					MismatchSide::MissingFromDocument => {
						(
							DocumentKind::Primary,
							format!("{prefix}{} is missing from the {}", mismatch.identifier, mismatch.document),
						)
					}
					MismatchSide::MissingFromPrimary => {
						(
							mismatch.document,
							format!("{prefix}{} is missing from the technique table", mismatch.identifier),
						)
					}
				};
				println!(
					"::error file={},line={}::{message}",
					kind.path(&config).display(),
					mismatch.line
				);
			}
			for duplicate in &report.duplicates {
				println!(
					"::error file={},line={}::{prefix}{} is listed {} times",
					duplicate.document.path(&config).display(),
					duplicate.lines.first().copied().unwrap_or(1),
					duplicate.identifier,
					duplicate.lines.len()
				);
			}
		}
		OutputFormat::Text => {
			if report.is_ok() {
				println!(
					"All {} technique(s) are consistent across documents.",
					report.primary_count
				);
			} else {
				print_consistency_report(&report, &config);
			}
		}
	}

	if !report.is_ok() {
		process::exit(1);
	}

	Ok(())
}

fn print_consistency_report(report: &ConsistencyReport, config: &TechsyncConfig) {
	let prefix = config.namespace_prefix();
	let primary = DocumentKind::Primary.path(config).display().to_string();

	for mismatch in &report.mismatches {
		match mismatch.side {
			MismatchSide::MissingFromDocument => {
				eprintln!(
					"  {} {prefix}{} ({primary}:{}) is missing from the {}",
					colored!("missing:", red),
					mismatch.identifier,
					mismatch.line,
					mismatch.document,
				);
			}
			MismatchSide::MissingFromPrimary => {
				eprintln!(
					"  {} {prefix}{} ({}:{}) is not in the technique table",
					colored!("unknown:", red),
					mismatch.identifier,
					mismatch.document.path(config).display(),
					mismatch.line,
				);
			}
		}
	}

	for duplicate in &report.duplicates {
		let lines: Vec<String> = duplicate.lines.iter().map(ToString::to_string).collect();
		eprintln!(
			"  {} {prefix}{} is listed {} times in the {} (lines {})",
			colored!("duplicate:", red),
			duplicate.identifier,
			duplicate.lines.len(),
			duplicate.document,
			lines.join(", "),
		);
	}

	let error = TechsyncError::Inconsistent {
		count: report.problem_count(),
	};
	let report: miette::Report = error.into();
	eprintln!("\n{report:?}");
}

fn run_derive(args: &TechsyncCli, check: bool, diff: bool) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let primary_path = root.join(&config.documents.primary);
	let secondary_path = root.join(&config.documents.secondary);
	let rel = make_relative(&secondary_path, &root);

	let derived = derive_variant_file(&primary_path, &secondary_path, &config)?;
	let expected = derived.to_text();
	// A missing variant is simply stale.
	let current = std::fs::read_to_string(&secondary_path).unwrap_or_default();
	let up_to_date = current == expected;

	if up_to_date {
		println!("{rel} is up to date.");
		return Ok(());
	}

	if diff {
		eprintln!("{}:", colored!(&rel, bold));
		print_diff(&current, &expected);
	}

	if check {
		eprintln!("{} {rel} is stale. Run `techsync derive` to regenerate it.", colored!("stale:", red));
		process::exit(1);
	}

	derived.save(&secondary_path)?;
	println!("Derived {rel}.");

	Ok(())
}

fn run_sections(args: &TechsyncCli, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;

	for kind in [DocumentKind::Primary, DocumentKind::Secondary] {
		let path = root.join(kind.path(&config));
		if kind == DocumentKind::Secondary && !path.exists() {
			println!(
				"{} {} not found, skipping",
				colored!("warning:", yellow),
				make_relative(&path, &root)
			);
			continue;
		}

		let mut document = Document::load(&root, &config, kind)?;
		let report = recompute_sections(&mut document.lines, &config.sections)?;
		let rel = make_relative(&document.path, &root);

		if dry_run || args.verbose {
			println!("{}", colored!(&rel, bold));
			for line in &report.banner {
				println!("{line}");
			}
		}

		if !report.changed {
			println!("{rel}: sections banner is up to date.");
		} else if dry_run {
			println!("Dry run: would update the sections banner of {rel}.");
		} else {
			document.save()?;
			println!("{rel}: updated the sections banner.");
		}
	}

	Ok(())
}

fn run_update(
	args: &TechsyncCli,
	release: Option<&str>,
	dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let mut documents = DocumentSet::load(&root, &config)?;

	let report = check_consistency(
		&documents.primary.lines,
		&documents.cli.lines,
		&documents.docs.lines,
		&config,
	)?;
	if !report.is_ok() {
		print_consistency_report(&report, &config);
		process::exit(1);
	}

	let today = chrono::Local::now().date_naive();
	recompute_sections(&mut documents.primary.lines, &config.sections)?;
	let written = recompute_version(&mut documents.primary.lines, &config.version, release, today)?;

	let secondary_path = root.join(&config.documents.secondary);
	let secondary = derive_secondary(&documents.primary.lines, &config)?;

	let registry = Registry::harvest(&documents.primary.lines, &config)?;
	let extractor = Extractor::new(&config)?;
	let links = refresh_links(&mut documents.docs.lines, &registry, &extractor, &config.links)?;

	let mut changed: Vec<(PathBuf, &LineStore)> = Vec::new();
	for (path, lines) in [
		(&documents.primary.path, &documents.primary.lines),
		(&secondary_path, &secondary),
		(&documents.docs.path, &documents.docs.lines),
	] {
		let current = std::fs::read_to_string(path).unwrap_or_default();
		if current != lines.to_text() {
			changed.push((path.clone(), lines));
		}
	}

	if changed.is_empty() {
		println!("Everything is up to date (version {written}).");
		return Ok(());
	}

	if dry_run {
		println!("Dry run: would update {} file(s):", changed.len());
		for (path, _) in &changed {
			println!("  {}", make_relative(path, &root));
		}
		return Ok(());
	}

	for (path, lines) in &changed {
		lines.save(path)?;
	}

	println!(
		"Updated {} file(s) to version {written}, {links} source link(s) refreshed.",
		changed.len()
	);
	if args.verbose {
		for (path, _) in &changed {
			println!("  {}", make_relative(path, &root));
		}
	}

	Ok(())
}

fn run_list(args: &TechsyncCli, format: ListOutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let primary = Document::load(&root, &config, DocumentKind::Primary)?;
	let registry = Registry::harvest(&primary.lines, &config)?;

	if let ListOutputFormat::Json = format {
		let entries: Vec<_> = registry.iter().collect();
		println!("{}", serde_json::to_string_pretty(&entries)?);
		return Ok(());
	}

	if registry.is_empty() {
		println!("No techniques found.");
		return Ok(());
	}

	println!("{}", colored!("Techniques:", bold));
	let prefix = config.namespace_prefix();
	for entry in registry.iter() {
		let line = entry
			.source_line
			.map_or_else(|| "?".to_string(), |line| line.to_string());
		let license = if entry.is_restricted() { " [GPL]" } else { "" };
		println!(
			"  {prefix}{:<28} {:>3}%  line {line:<6} {}{license}",
			entry.identifier, entry.score, entry.platforms.glyphs()
		);
	}

	println!("\n{} technique(s)", registry.len());

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
