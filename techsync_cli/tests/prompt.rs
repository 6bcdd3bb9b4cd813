use std::io::Cursor;

use rstest::rstest;
use techsync_cli::Prompter;
use techsync_cli::collect_draft;
use techsync_cli::parse_yes_no;
use techsync_core::AnyEmptyResult;
use techsync_core::PlatformSet;
use techsync_core::validate_score;

#[rstest]
#[case::empty("", false)]
#[case::short_yes("y", true)]
#[case::long_yes("YES", true)]
#[case::short_no("n", false)]
#[case::padded(" no ", false)]
fn yes_no_answers(#[case] answer: &str, #[case] expected: bool) {
	let parsed = parse_yes_no(answer).unwrap_or_else(|e| panic!("{answer:?}: {e}"));
	assert_eq!(parsed, expected);
}

#[test]
fn yes_no_rejects_other_answers() {
	let error = parse_yes_no("maybe").err().unwrap_or_else(|| panic!("expected an error"));
	assert!(error.is_input_validation());
}

#[test]
fn ask_valid_repeats_until_accepted() -> AnyEmptyResult {
	let mut output = Vec::new();
	let mut prompter = Prompter::new(Cursor::new("101\n-4\nninety\n42\n"), &mut output);

	let score = prompter.ask_valid("Score?", validate_score)?;
	assert_eq!(score, 42);
	drop(prompter);

	let output = String::from_utf8(output)?;
	assert_eq!(output.matches("Score?").count(), 4);
	assert_eq!(output.matches("try again").count(), 3);
	assert!(output.contains("101 is outside 0 to 100"));

	Ok(())
}

#[test]
fn empty_score_aborts_without_asking_again() -> AnyEmptyResult {
	let mut output = Vec::new();
	let mut prompter = Prompter::new(Cursor::new("\n42\n"), &mut output);

	let result = prompter.ask_valid("Score?", validate_score);
	let error = result.err().unwrap_or_else(|| panic!("expected an error"));
	assert!(error.to_string().contains("a score is mandatory"));
	drop(prompter);

	let output = String::from_utf8(output)?;
	assert_eq!(output.matches("Score?").count(), 1);
	assert!(!output.contains("try again"));

	Ok(())
}

#[test]
fn ask_fails_when_input_closes() {
	let mut output = Vec::new();
	let mut prompter = Prompter::new(Cursor::new("nope\n"), &mut output);

	let result = prompter.ask_valid("Score?", validate_score);
	assert!(result.is_err());
}

#[test]
fn collect_draft_builds_a_valid_entry() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("kvm_shadow.cpp"),
		"[[nodiscard]] static bool kvm_shadow() {\n    return false;\n}\n",
	)?;

	let answers = [
		"kvm_shadow",
		"kvm_shadow.cpp",
		"kvm_shadow()",
		"no",
		"linux",
		"45",
		"Checks for shadow page table artifacts left behind by KVM guests",
		"KVM shadow pages",
		"Requiem",
		"",
		"y",
		"y",
		"n",
		"y",
		"Only reliable on bare metal hosts",
	]
	.join("\n");

	let mut output = Vec::new();
	let mut prompter = Prompter::new(Cursor::new(answers), &mut output);
	let draft = collect_draft(&mut prompter, tmp.path())?;
	let entry = draft.validate()?;

	assert_eq!(entry.identifier, "KVM_SHADOW");
	assert_eq!(entry.implementation_reference, "kvm_shadow");
	assert_eq!(
		entry.platforms,
		PlatformSet {
			linux: true,
			..PlatformSet::default()
		}
	);
	assert_eq!(entry.score, 45);
	assert_eq!(entry.author.as_deref(), Some("Requiem"));
	assert_eq!(entry.source_link, None);
	assert!(entry.requires_admin);
	assert!(entry.is_restricted());
	assert_eq!(entry.notes.as_deref(), Some("Only reliable on bare metal hosts"));
	assert!(entry.implementation_body.ends_with('}'));

	Ok(())
}

#[test]
fn collect_draft_rejects_headers_in_implementation() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("bad.cpp"), "#include <intrin.h>\nstatic bool bad();\n")?;

	let mut output = Vec::new();
	let mut prompter = Prompter::new(Cursor::new("BAD\nbad.cpp\n"), &mut output);
	assert!(collect_draft(&mut prompter, tmp.path()).is_err());
	drop(prompter);

	let output = String::from_utf8(output)?;
	assert!(output.contains("do not use #include"));

	Ok(())
}
