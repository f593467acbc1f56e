//! Structured diagnostic messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// A 1-based line and column inside a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

/// A diagnostic message about one source file.
///
/// This is the payload of the host's build-failed message: the file the
/// compile job was for, plus the compiler's message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The file the diagnostic refers to.
    pub file: PathBuf,
    /// Where in the file, when the compiler reported a position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// The message text.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error diagnostic without a location.
    pub fn error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, file, message)
    }

    /// Creates a warning diagnostic without a location.
    pub fn warning(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, file, message)
    }

    /// Creates a diagnostic with the given severity.
    pub fn new(severity: Severity, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity,
            file: file.into(),
            location: None,
            message: message.into(),
        }
    }

    /// Attaches a line/column location.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(Location { line, column });
        self
    }

    /// Returns `true` if this diagnostic fails the compilation.
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}
