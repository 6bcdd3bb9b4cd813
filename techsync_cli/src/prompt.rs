//! Interactive description of a new technique.
//!
//! Every question is validated on its own, so a bad answer only repeats that
//! question instead of aborting the whole run.

use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use techsync_core::AnyResult;
use techsync_core::DESCRIPTION_MAX_CHARS;
use techsync_core::DESCRIPTION_MIN_CHARS;
use techsync_core::EntryDraft;
use techsync_core::SHORT_LABEL_MAX_CHARS;
use techsync_core::TechsyncError;
use techsync_core::TechsyncResult;
use techsync_core::validate_description;
use techsync_core::validate_function_name;
use techsync_core::validate_identifier;
use techsync_core::validate_implementation_body;
use techsync_core::validate_implementation_path;
use techsync_core::validate_platforms;
use techsync_core::validate_score;
use techsync_core::validate_short_label;

/// Question and answer over any line-based reader and writer.
pub struct Prompter<R, W> {
	input: R,
	output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
	pub fn new(input: R, output: W) -> Self {
		Self { input, output }
	}

	/// Ask one question and return the answer without its line ending.
	pub fn ask(&mut self, question: &str) -> io::Result<String> {
		write!(self.output, "{question} ")?;
		self.output.flush()?;

		let mut answer = String::new();
		if self.input.read_line(&mut answer)? == 0 {
			return Err(io::Error::new(
				io::ErrorKind::UnexpectedEof,
				format!("input closed before answering `{question}`"),
			));
		}

		Ok(answer.trim_end_matches(['\r', '\n']).to_string())
	}

	/// Ask until `validate` accepts the answer. Input validation errors are
	/// shown and the question is repeated; any other error is returned.
	pub fn ask_valid<T>(
		&mut self,
		question: &str,
		mut validate: impl FnMut(&str) -> TechsyncResult<T>,
	) -> AnyResult<T> {
		loop {
			let answer = self.ask(question)?;
			match validate(&answer) {
				Ok(value) => return Ok(value),
				Err(e) if e.is_input_validation() => writeln!(self.output, "{e}, try again")?,
				Err(e) => return Err(e.into()),
			}
		}
	}

	pub fn confirm(&mut self, question: &str) -> AnyResult<bool> {
		self.ask_valid(&format!("{question} [y/N]"), parse_yes_no)
	}
}

/// An empty answer means no.
pub fn parse_yes_no(answer: &str) -> TechsyncResult<bool> {
	match answer.trim().to_ascii_lowercase().as_str() {
		"y" | "yes" => Ok(true),
		"" | "n" | "no" => Ok(false),
		other => {
			Err(TechsyncError::input(
				"answer",
				format!("`{other}` is neither yes nor no"),
			))
		}
	}
}

/// Ask for every field of a new technique. Relative implementation files are
/// resolved against `base`.
pub fn collect_draft<R: BufRead, W: Write>(
	prompter: &mut Prompter<R, W>,
	base: &Path,
) -> AnyResult<EntryDraft> {
	let identifier = prompter.ask_valid(
		"Name of the technique flag (e.g. VBOX_REG or HYPERVISOR_STR)?",
		validate_identifier,
	)?;

	let (implementation_file, implementation_body) =
		prompter.ask_valid("Path to the .cpp file holding the implementation?", |answer| {
			read_implementation(base, answer)
		})?;

	let function = prompter.ask_valid(
		"Name of the technique function (empty to use the lower-case flag name)?",
		|answer| validate_function_name(answer, &identifier),
	)?;

	let cross_platform = prompter.confirm("Is it cross-platform?")?;
	let platforms = if cross_platform {
		Vec::new()
	} else {
		prompter.ask_valid(
			"Which platforms does it support? (comma separated: linux, windows, macos)",
			|answer| {
				let names = split_list(answer);
				validate_platforms(false, &names).map(|_| names)
			},
		)?
	};

	let score = prompter.ask_valid("What is the certainty score? (0 to 100)", validate_score)?;

	let description = prompter.ask_valid(
		&format!(
			"Describe the technique ({DESCRIPTION_MIN_CHARS} to {DESCRIPTION_MAX_CHARS} \
			 characters)?"
		),
		validate_description,
	)?;

	let short_label = prompter.ask_valid(
		&format!("Short label for the CLI checklist (at most {SHORT_LABEL_MAX_CHARS} characters)?"),
		|answer| validate_short_label(answer, &description),
	)?;

	let author = prompter.ask("Who is the author? (optional)")?;
	let source_link = prompter.ask("Link to the source of the technique? (optional)")?;
	let admin = prompter.confirm("Does it require admin privileges?")?;
	let restricted = prompter.confirm("Is it GPL-3.0 licensed?")?;
	let only_32_bit = prompter.confirm("Is it 32-bit only?")?;
	let x86_only = prompter.confirm("Is it x86 only?")?;
	let notes = prompter.ask("Any extra notes? (optional)")?;

	Ok(EntryDraft {
		identifier,
		function,
		implementation_file: Some(implementation_file),
		implementation_body: Some(implementation_body),
		cross_platform,
		platforms,
		score: Some(i64::from(score)),
		description,
		short_label,
		author,
		source_link,
		admin,
		restricted,
		only_32_bit,
		x86_only,
		notes,
	})
}

fn read_implementation(base: &Path, answer: &str) -> TechsyncResult<(PathBuf, String)> {
	let file = PathBuf::from(answer.trim());
	validate_implementation_path(&file)?;

	let path = base.join(&file);
	let body = std::fs::read_to_string(&path).map_err(|e| {
		TechsyncError::input(
			"implementation_file",
			format!("cannot read `{}`: {e}", path.display()),
		)
	})?;

	Ok((file, validate_implementation_body(&body)?))
}

fn split_list(answer: &str) -> Vec<String> {
	answer
		.split(',')
		.map(|name| name.trim().to_ascii_lowercase())
		.filter(|name| !name.is_empty())
		.collect()
}
