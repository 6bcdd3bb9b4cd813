mod common;

use predicates::prelude::PredicateBooleanExt;
use techsync_core::AnyEmptyResult;

#[test]
fn derive_writes_license_variant() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());

	common::techsync_cmd()
		.arg("derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Derived src/vmaware_MIT.hpp."));

	let secondary = common::read(tmp.path(), common::SECONDARY_PATH);
	assert!(!secondary.contains("/* GPL */"));
	assert!(!secondary.contains("GPL-3.0"));
	assert!(secondary.contains(" *  - License: MIT"));
	assert!(secondary.contains("{ VM::VMID, { 100, VM::vmid } },"));

	// a second run is a no-op
	common::techsync_cmd()
		.arg("derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("is up to date"));
	similar_asserts::assert_eq!(common::read(tmp.path(), common::SECONDARY_PATH), secondary);

	Ok(())
}

#[test]
fn derive_check_fails_when_stale() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	common::write(tmp.path(), common::SECONDARY_PATH, "stale\n");

	common::techsync_cmd()
		.arg("derive")
		.arg("--check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("-stale")
				.and(predicates::str::contains("+ *  - License: MIT"))
				.and(predicates::str::contains("is stale")),
		);

	similar_asserts::assert_eq!(common::read(tmp.path(), common::SECONDARY_PATH), "stale\n");

	Ok(())
}

#[test]
fn derive_check_passes_after_derive() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());

	common::techsync_cmd()
		.arg("derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::techsync_cmd()
		.arg("derive")
		.arg("--check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("is up to date"));

	Ok(())
}

#[test]
fn derive_without_primary_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::techsync_cmd()
		.arg("derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("techsync::derivation"));

	assert!(!tmp.path().join(common::SECONDARY_PATH).exists());

	Ok(())
}

#[test]
fn derive_duplicate_license_line_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_project(tmp.path());
	let license = " *  - License: GPL-3.0 (https://www.gnu.org/licenses/gpl-3.0.html)\n";
	let primary = common::primary_text().replacen(license, &format!("{license}{license}"), 1);
	common::write(tmp.path(), common::PRIMARY_PATH, &primary);

	common::techsync_cmd()
		.arg("derive")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("techsync::duplicate_anchor"));

	Ok(())
}
