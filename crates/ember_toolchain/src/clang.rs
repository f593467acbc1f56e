use std::path::Path;
use std::process::Command;

use ember_build::{CompileRequest, CompilerFrontend, FrontendError};
use ember_common::SourceKind;
use ember_config::ToolchainConfig;
use ember_diagnostics::{parse_compiler_output, Diagnostic};
use tracing::{debug, warn};

/// Compiles C, C++ and Objective-C++ units to LLVM bitcode.
#[derive(Debug, Clone)]
pub struct ClangFrontend {
    toolchain: ToolchainConfig,
}

impl ClangFrontend {
    /// Creates a frontend using the given tools.
    pub fn new(toolchain: ToolchainConfig) -> Self {
        Self { toolchain }
    }

    /// The compiler and language arguments for a unit of `kind`, or `None`
    /// if the kind is not compiled.
    fn driver(&self, kind: SourceKind) -> Option<(&str, Vec<String>)> {
        let std = format!("-std={}", self.toolchain.cxx_standard);
        match kind {
            SourceKind::C => Some((self.toolchain.c_compiler.as_str(), vec!["-x".into(), "c".into()])),
            SourceKind::Cpp => Some((
                self.toolchain.cxx_compiler.as_str(),
                vec!["-x".into(), "c++".into(), std],
            )),
            SourceKind::ObjCpp => Some((
                self.toolchain.cxx_compiler.as_str(),
                vec!["-x".into(), "objective-c++".into(), std],
            )),
            SourceKind::Header | SourceKind::Other => None,
        }
    }
}

impl CompilerFrontend for ClangFrontend {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>, FrontendError> {
        let unit = request.unit.path();
        let Some((compiler, language)) = self.driver(request.unit.kind()) else {
            return Err(FrontendError::Diagnostics(vec![Diagnostic::error(
                unit,
                "not a C, C++ or Objective-C++ source file",
            )]));
        };

        let output_file = tempfile::Builder::new()
            .prefix("ember-")
            .suffix(".bc")
            .tempfile()
            .map_err(|source| FrontendError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let output = Command::new(compiler)
            .args(&language)
            .arg("-emit-llvm")
            .args(request.flags)
            .arg("-o")
            .arg(output_file.path())
            .arg(request.source)
            .output()
            .map_err(|source| FrontendError::Invoke {
                tool: compiler.to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = parse_compiler_output(&stderr, unit, request.source);

        if !output.status.success() {
            return Err(FrontendError::Diagnostics(with_fallback(
                diagnostics,
                unit,
                &stderr,
                output.status.code(),
            )));
        }

        for diagnostic in &diagnostics {
            debug!(unit = %unit.display(), "{}", diagnostic.message);
        }
        if !diagnostics.is_empty() {
            warn!(unit = %unit.display(), count = diagnostics.len(), "compiled with warnings");
        }

        std::fs::read(output_file.path()).map_err(|source| FrontendError::Io {
            path: output_file.path().to_path_buf(),
            source,
        })
    }
}

/// Guarantees at least one error when the compiler failed. Output with no
/// recognizable error line is reported verbatim.
fn with_fallback(
    mut diagnostics: Vec<Diagnostic>,
    unit: &Path,
    raw: &str,
    status: Option<i32>,
) -> Vec<Diagnostic> {
    if diagnostics.iter().any(Diagnostic::is_error) {
        return diagnostics;
    }
    let raw = raw.trim();
    let message = if raw.is_empty() {
        match status {
            Some(code) => format!("compiler exited with status {code}"),
            None => "compiler terminated by a signal".to_string(),
        }
    } else {
        raw.to_string()
    };
    diagnostics.push(Diagnostic::error(unit, message));
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_common::SourceUnit;

    #[test]
    fn driver_selection() {
        let frontend = ClangFrontend::new(ToolchainConfig::default());

        let (compiler, args) = frontend.driver(SourceKind::C).unwrap();
        assert_eq!(compiler, "clang");
        assert_eq!(args, vec!["-x", "c"]);

        let (compiler, args) = frontend.driver(SourceKind::Cpp).unwrap();
        assert_eq!(compiler, "clang++");
        assert_eq!(args, vec!["-x", "c++", "-std=c++11"]);

        let (_, args) = frontend.driver(SourceKind::ObjCpp).unwrap();
        assert_eq!(args[1], "objective-c++");

        assert!(frontend.driver(SourceKind::Header).is_none());
        assert!(frontend.driver(SourceKind::Other).is_none());
    }

    #[test]
    fn missing_compiler_is_an_invoke_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cpp");
        std::fs::write(&path, "int main(){return 0;}").unwrap();

        let frontend = ClangFrontend::new(ToolchainConfig {
            cxx_compiler: "ember-test-no-such-compiler".into(),
            ..ToolchainConfig::default()
        });
        let unit = SourceUnit::new(&path);
        let err = frontend
            .compile(&CompileRequest {
                unit: &unit,
                source: &path,
                flags: &[],
            })
            .unwrap_err();
        assert!(matches!(err, FrontendError::Invoke { .. }));
    }

    #[test]
    fn headers_are_rejected() {
        let unit = SourceUnit::new("/p/util.h");
        let err = ClangFrontend::new(ToolchainConfig::default())
            .compile(&CompileRequest {
                unit: &unit,
                source: Path::new("/p/util.h"),
                flags: &[],
            })
            .unwrap_err();
        assert!(matches!(err, FrontendError::Diagnostics(d) if d.len() == 1));
    }

    #[test]
    fn fallback_keeps_raw_output() {
        let diags = with_fallback(Vec::new(), Path::new("/p/a.cpp"), "clang: crashed\n", Some(1));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "clang: crashed");

        let diags = with_fallback(Vec::new(), Path::new("/p/a.cpp"), "", Some(254));
        assert_eq!(diags[0].message, "compiler exited with status 254");
    }

    #[test]
    fn fallback_leaves_real_errors_alone() {
        let existing = vec![Diagnostic::error("/p/a.cpp", "expected ';'").at(3, 9)];
        let diags = with_fallback(existing.clone(), Path::new("/p/a.cpp"), "noise", Some(1));
        assert_eq!(diags, existing);
    }
}
