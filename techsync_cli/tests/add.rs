mod common;

use predicates::prelude::PredicateBooleanExt;
use techsync_core::AnyEmptyResult;

#[test]
fn add_from_entry_file_patches_every_document() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let entry = common::write_entry(tmp.path(), "hypervisor_str", 90);

	common::techsync_cmd()
		.arg("add")
		.arg("--entry")
		.arg(&entry)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("Added VM::HYPERVISOR_STR")
				.and(predicates::str::contains("src/vmaware.hpp: 4 update(s)"))
				.and(predicates::str::contains("src/cli.cpp: 4 update(s)"))
				.and(predicates::str::contains("docs/documentation.md: 1 update(s)"))
				.and(predicates::str::contains("Derived src/vmaware_MIT.hpp")),
		);

	let primary = common::read(tmp.path(), common::PRIMARY_PATH);
	assert!(primary.contains("        HYPERVISOR_STR,\n"));
	assert!(primary.contains("@implements VM::HYPERVISOR_STR"));
	assert!(primary.contains("{ VM::HYPERVISOR_STR, { 90, VM::hypervisor_str } },"));
	assert!(primary.contains("case HYPERVISOR_STR: return \"HYPERVISOR_STR\";"));

	let cli = common::read(tmp.path(), common::CLI_PATH);
	assert!(cli.contains("checker(VM::HYPERVISOR_STR, \"CPUID brand string\");"));
	assert_eq!(cli.matches("case VM::HYPERVISOR_STR:").count(), 3);

	let docs = common::read(tmp.path(), common::DOCS_PATH);
	assert!(docs.contains("| `VM::HYPERVISOR_STR` |"));
	assert!(docs.contains("| 90% |"));

	let secondary = common::read(tmp.path(), common::SECONDARY_PATH);
	assert!(secondary.contains("{ VM::HYPERVISOR_STR, { 90, VM::hypervisor_str } },"));
	assert!(!secondary.contains("GAMARUE"));
	assert!(secondary.contains(" *  - License: MIT"));

	common::techsync_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("All 3 technique(s)"));

	Ok(())
}

#[test]
fn add_no_derive_leaves_variant_alone() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let entry = common::write_entry(tmp.path(), "HYPERVISOR_STR", 90);

	common::techsync_cmd()
		.arg("add")
		.arg("--entry")
		.arg(&entry)
		.arg("--no-derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(!tmp.path().join(common::SECONDARY_PATH).exists());

	Ok(())
}

#[test]
fn add_rejects_existing_identifier() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let entry = common::write_entry(tmp.path(), "VMID", 90);

	common::techsync_cmd()
		.arg("add")
		.arg("--entry")
		.arg(&entry)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("techsync::duplicate_identifier"));

	similar_asserts::assert_eq!(
		common::read(tmp.path(), common::PRIMARY_PATH),
		common::primary_text()
	);
	similar_asserts::assert_eq!(common::read(tmp.path(), common::CLI_PATH), common::CLI);
	similar_asserts::assert_eq!(common::read(tmp.path(), common::DOCS_PATH), common::DOCS);

	Ok(())
}

#[test]
fn add_invalid_entry_file_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let entry = common::write_entry(tmp.path(), "HYPERVISOR_STR", 101);

	common::techsync_cmd()
		.arg("add")
		.arg("--entry")
		.arg(&entry)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("techsync::input_validation"));

	similar_asserts::assert_eq!(
		common::read(tmp.path(), common::PRIMARY_PATH),
		common::primary_text()
	);

	Ok(())
}

#[test]
fn add_missing_anchor_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let docs = common::DOCS.replace("<!-- ADD TECHNIQUE DETAILS HERE -->\n", "");
	common::write(tmp.path(), common::DOCS_PATH, &docs);
	let entry = common::write_entry(tmp.path(), "HYPERVISOR_STR", 90);

	common::techsync_cmd()
		.arg("add")
		.arg("--entry")
		.arg(&entry)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("techsync::missing_anchor"));

	similar_asserts::assert_eq!(
		common::read(tmp.path(), common::PRIMARY_PATH),
		common::primary_text()
	);
	similar_asserts::assert_eq!(common::read(tmp.path(), common::CLI_PATH), common::CLI);

	Ok(())
}

#[test]
fn add_interactive_reprompts_invalid_answers() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	common::write(tmp.path(), "hypervisor_str.cpp", common::HYPERVISOR_STR_CPP);

	let answers = [
		"hypervisor_str",
		"hypervisor_str.c",
		"hypervisor_str.cpp",
		"",
		"n",
		"linux, windows",
		"abc",
		"90",
		common::HYPERVISOR_STR_DESCRIPTION,
		"CPUID brand string",
		"",
		"",
		"n",
		"n",
		"n",
		"n",
		"",
	]
	.join("\n");

	common::techsync_cmd()
		.current_dir(tmp.path())
		.arg("add")
		.arg("--no-derive")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin(format!("{answers}\n"))
		.assert()
		.success()
		.stdout(
			predicates::str::contains("must be a .cpp or .cc file, try again")
				.and(predicates::str::contains("`abc` is not an integer, try again"))
				.and(predicates::str::contains("Added VM::HYPERVISOR_STR")),
		);

	let cli = common::read(tmp.path(), common::CLI_PATH);
	assert_eq!(cli.matches("case VM::HYPERVISOR_STR:").count(), 2);

	let docs = common::read(tmp.path(), common::DOCS_PATH);
	assert!(docs.contains("| `VM::HYPERVISOR_STR` |"));
	assert!(docs.contains("| 🐧🪟 |"));

	Ok(())
}

#[test]
fn add_interactive_closed_input_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());

	common::techsync_cmd()
		.current_dir(tmp.path())
		.arg("add")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("HYPERVISOR_STR\n")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("input closed"));

	similar_asserts::assert_eq!(
		common::read(tmp.path(), common::PRIMARY_PATH),
		common::primary_text()
	);

	Ok(())
}
