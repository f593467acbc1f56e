//! Error types for the orchestrator and its collaborators.

use std::path::{Path, PathBuf};

use ember_cache::CacheError;
use ember_diagnostics::Diagnostic;

/// Errors raised while constructing or tearing down the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The cache directory could not be prepared.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A worker or control thread could not be started.
    #[error("failed to start {what} thread: {source}")]
    Spawn {
        /// Which thread.
        what: &'static str,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// A failed compilation.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    /// The compiler ran and rejected the source.
    #[error("compilation failed with {} diagnostic(s)", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    /// The compiler could not be started.
    #[error("failed to invoke {tool}: {source}")]
    Invoke {
        /// The program that failed to start.
        tool: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Scratch files for the compiler could not be written or read.
    #[error("compiler I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl FrontendError {
    /// Converts the failure into diagnostics for `unit`, producing at least
    /// one error.
    pub fn into_diagnostics(self, unit: &Path) -> Vec<Diagnostic> {
        match self {
            FrontendError::Diagnostics(diagnostics) if diagnostics.iter().any(Diagnostic::is_error) => {
                diagnostics
            }
            FrontendError::Diagnostics(mut diagnostics) => {
                diagnostics.push(Diagnostic::error(unit, "compilation failed"));
                diagnostics
            }
            other => vec![Diagnostic::error(unit, other.to_string())],
        }
    }
}

/// A failed link or run.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Nothing to link.
    #[error("no modules to link")]
    NoModules,

    /// A backend tool could not be started.
    #[error("failed to invoke {tool}: {source}")]
    Invoke {
        /// The program that failed to start.
        tool: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A backend tool ran and reported failure.
    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        /// The program that failed.
        tool: String,
        /// Its error output.
        stderr: String,
    },

    /// Scratch files could not be written or read.
    #[error("backend I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_diagnostics::Severity;

    #[test]
    fn invoke_failure_becomes_one_error() {
        let err = FrontendError::Invoke {
            tool: "clang++".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let diags = err.into_diagnostics(Path::new("/p/a.cpp"));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert!(diags[0].message.contains("clang++"));
        assert_eq!(diags[0].file, PathBuf::from("/p/a.cpp"));
    }

    #[test]
    fn warnings_only_get_an_error_appended() {
        let err = FrontendError::Diagnostics(vec![Diagnostic::warning("/p/a.cpp", "unused")]);
        let diags = err.into_diagnostics(Path::new("/p/a.cpp"));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert!(diags[1].is_error());
    }

    #[test]
    fn errors_pass_through() {
        let err = FrontendError::Diagnostics(vec![Diagnostic::error("/p/a.cpp", "bad").at(1, 5)]);
        let diags = err.into_diagnostics(Path::new("/p/a.cpp"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "bad");
    }

    #[test]
    fn backend_error_display() {
        let err = BackendError::ToolFailed {
            tool: "llvm-link".into(),
            stderr: "symbol multiply defined".into(),
        };
        assert_eq!(err.to_string(), "llvm-link failed: symbol multiply defined");
    }
}
