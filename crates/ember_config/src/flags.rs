//! Compiler flag assembly from project build settings.

use std::path::Path;

use crate::types::{BuildInfo, ToolchainConfig};

/// Assembles the flags for compiling `unit`.
///
/// Order: base include directories, `-c`, extra compiler flags, builtin
/// defines then project defines, then include paths for the unit's own
/// directory, the system path, the user path and the modules folder. Empty
/// settings are skipped. Language selection and output options are left to
/// the frontend.
pub fn compile_flags(info: &BuildInfo, toolchain: &ToolchainConfig, unit: &Path) -> Vec<String> {
    let mut flags: Vec<String> = toolchain
        .include_dirs
        .iter()
        .map(|dir| format!("-I{dir}"))
        .collect();

    flags.push("-c".to_string());
    flags.extend(info.extra_compiler_flags.iter().cloned());

    flags.extend(
        toolchain
            .builtin_defines
            .iter()
            .chain(info.defines.iter())
            .map(|d| format!("-D{d}")),
    );

    if let Some(parent) = unit.parent().filter(|p| !p.as_os_str().is_empty()) {
        flags.push(format!("-I{}", parent.display()));
    }
    for path in [&info.system_path, &info.user_path, &info.modules_folder] {
        let path = path.trim();
        if !path.is_empty() {
            flags.push(format!("-I{path}"));
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_in_order() {
        let info = BuildInfo {
            system_path: "/sys".to_string(),
            user_path: String::new(),
            defines: vec!["APP=1".to_string()],
            extra_compiler_flags: vec!["-Wall".to_string()],
            modules_folder: "/mods".to_string(),
            ..BuildInfo::default()
        };
        let toolchain = ToolchainConfig {
            include_dirs: vec!["/usr/local/include".to_string()],
            ..ToolchainConfig::default()
        };
        let flags = compile_flags(&info, &toolchain, Path::new("/proj/src/a.cpp"));
        assert_eq!(
            flags,
            vec![
                "-I/usr/local/include",
                "-c",
                "-Wall",
                "-DNDEBUG=1",
                "-DAPP=1",
                "-I/proj/src",
                "-I/sys",
                "-I/mods",
            ]
        );
    }

    #[test]
    fn bare_file_name_has_no_parent_include() {
        let flags = compile_flags(
            &BuildInfo::default(),
            &ToolchainConfig::default(),
            Path::new("a.c"),
        );
        assert_eq!(flags, vec!["-c", "-DNDEBUG=1"]);
    }
}
