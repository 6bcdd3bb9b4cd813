#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use techsync_core::VersionConfig;

pub const PRIMARY_PATH: &str = "src/vmaware.hpp";
pub const SECONDARY_PATH: &str = "src/vmaware_MIT.hpp";
pub const CLI_PATH: &str = "src/cli.cpp";
pub const DOCS_PATH: &str = "docs/documentation.md";

pub fn techsync_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("techsync"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

const PRIMARY_TEMPLATE: &str = r#"/**
 * ██╗   ██╗███╗   ███╗ █████╗ ██╗    ██╗ █████╗ ██████╗ ███████╗
__BANNER__1.9 (September 2026)
 *
 *  C++ VM detection library
 *
 *  - Made by: kernelwernel (https://github.com/kernelwernel)
 *  - Repository: https://github.com/kernelwernel/VMAware
 *  - License: GPL-3.0 (https://www.gnu.org/licenses/gpl-3.0.html)
 *
 * ============================== SECTIONS ==================================
 * - enums for publicly accessible techniques  => line 0
 * - struct for internal cpu operations        => line 0
 * - struct for internal memoization           => line 0
 * - struct for internal utility functions     => line 0
 * - struct for internal core components       => line 0
 * - start of VM detection technique list      => line 0
 * - start of public VM detection functions    => line 0
 * - start of externally defined variables     => line 0
 * ==========================================================================
 */

#pragma once

struct VM {
public:
    enum enum_flags : u8 {
        VMID = 0,
        /* GPL */ GAMARUE,
        // ADD NEW TECHNIQUE ENUM NAME HERE
        NULL_ARG
    };

private:
    struct cpu {
        static bool is_intel();
    };

    struct memo {
        static bool cached;
    };

    struct util {
        static bool is_admin();
    };

private: // START OF PRIVATE VM DETECTION TECHNIQUE DEFINITIONS
    /**
     * @brief Check CPUID output of manufacturer ID for known VMs/hypervisors
     * @category x86
     * @implements VM::VMID
     */
    [[nodiscard]] static bool vmid() {
        return false;
    }

    /* GPL */ // @brief Check for the Gamarue ransomware artifacts
    /* GPL */ // @category Windows
    /* GPL */ // @warning Requires administrative privileges
    /* GPL */ // @implements VM::GAMARUE
    /* GPL */ [[nodiscard]] static bool gamarue() {
    /* GPL */     return false;
    /* GPL */ }

    // ADD NEW TECHNIQUE FUNCTION HERE

    struct core {
        static bool run_all();
    };

public: // START OF PUBLIC FUNCTIONS
    static std::string flag_to_string(const enum_flags flag) {
        switch (flag) {
            case VMID: return "VMID";
            /* GPL */ case GAMARUE: return "GAMARUE";
            // ADD NEW CASE HERE FOR NEW TECHNIQUE
            default: return "";
        }
    }
};

// ============= EXTERNAL DEFINITIONS =============

std::vector<VM::core::technique> VM::core::technique_table = {
    // START OF TECHNIQUE TABLE
    { VM::VMID, { 100, VM::vmid } },
    /* GPL */ { VM::GAMARUE, { 10, VM::gamarue } },
    // ADD NEW TECHNIQUE STRUCTURE TO TABLE HERE
    // END OF TECHNIQUE TABLE
};
"#;

pub const CLI: &str = r#"#include "vmaware.hpp"

static bool is_unsupported(VM::enum_flags flag) {
#if (LINUX)
    switch (flag) {
        case VM::VMID:
        // ADD LINUX FLAG
            return false;
        default: return true;
    }
#elif (WINDOWS)
    switch (flag) {
        case VM::VMID:
        case VM::GAMARUE:
        // ADD WINDOWS FLAG
            return false;
        default: return true;
    }
#else
    switch (flag) {
        case VM::VMID:
        // ADD MACOS FLAG
            return false;
        default: return true;
    }
#endif
}

static void checker(const VM::enum_flags flag, const char* message) {
    std::cout << message << "\n";
}

static void general() {
    checker(VM::VMID, "VMID");
    checker(VM::GAMARUE, "Gamarue ransomware");
    // checker(VM::RETIRED, "retired technique");
    // ADD NEW TECHNIQUE CHECKER HERE
}
"#;

pub const DOCS: &str = r"# Documentation

# Flag table
VMAware provides a flag for every technique. The VMs detected by each are listed below.

| Flag alias | Description | Supported platforms | Certainty | Admin? | GPL-3.0? | 32-bit only? | Notes | Code implementation |
| ---------- | ----------- | ------------------- | --------- | ------ | -------- | ------------ | ----- | ------------------- |
| `VM::VMID` | Check CPUID output of manufacturer ID for known VMs/hypervisors | 🐧🪟🍏 | 100% |  |  |  |  | [link](https://github.com/kernelwernel/VMAware/tree/main/src/vmaware.hpp#L1) |
| `VM::GAMARUE` | Check for the Gamarue ransomware artifacts | 🪟 | 10% | Yes | GPL |  |  | [link](https://github.com/kernelwernel/VMAware/tree/main/src/vmaware.hpp#L1) |
<!-- ADD TECHNIQUE DETAILS HERE -->

<br>

# Setting flags
";

pub const HYPERVISOR_STR_CPP: &str = "[[nodiscard]] static bool hypervisor_str() {
    return false;
}
";

pub const HYPERVISOR_STR_DESCRIPTION: &str =
	"Checks the CPUID hypervisor brand string for known VM vendor signatures";

pub fn primary_text() -> String {
	PRIMARY_TEMPLATE.replace("__BANNER__", &VersionConfig::default().banner)
}

/// Write the primary header, the CLI source and the docs below `root`.
pub fn write_project(root: &Path) {
	write(root, PRIMARY_PATH, &primary_text());
	write(root, CLI_PATH, CLI);
	write(root, DOCS_PATH, DOCS);
}

pub fn write(root: &Path, path: &str, content: &str) {
	let path = root.join(path);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

pub fn read(root: &Path, path: &str) -> String {
	let path = root.join(path);
	std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// An entry file for `HYPERVISOR_STR` next to its implementation.
pub fn write_entry(root: &Path, identifier: &str, score: i64) -> std::path::PathBuf {
	write(root, "hypervisor_str.cpp", HYPERVISOR_STR_CPP);
	let entry = format!(
		"identifier = \"{identifier}\"\nfunction = \"hypervisor_str\"\nimplementation_file = \
		 \"hypervisor_str.cpp\"\ncross_platform = true\nscore = {score}\ndescription = \
		 \"{HYPERVISOR_STR_DESCRIPTION}\"\nshort_label = \"CPUID brand string\"\n"
	);
	write(root, "entry.toml", &entry);
	root.join("entry.toml")
}
