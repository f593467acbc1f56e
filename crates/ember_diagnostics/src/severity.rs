//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic, mirroring the compiler's levels.
///
/// Ordered from least severe (`Note`) to most severe (`Fatal`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Additional context attached to another diagnostic.
    Note,
    /// An informational remark.
    Remark,
    /// A potential issue that doesn't stop compilation.
    Warning,
    /// A problem that makes the compilation fail.
    Error,
    /// An error after which the compiler stopped.
    Fatal,
}

impl Severity {
    /// Returns `true` for [`Error`](Severity::Error) and [`Fatal`](Severity::Fatal).
    pub fn is_error(self) -> bool {
        self >= Severity::Error
    }

    /// Parses the severity word used in compiler output (`fatal error`, `error`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "note" => Some(Severity::Note),
            "remark" => Some(Severity::Remark),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "fatal error" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Remark => write!(f, "remark"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Severity::Note < Severity::Remark);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn is_error() {
        assert!(Severity::Fatal.is_error());
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Note.is_error());
    }

    #[test]
    fn labels_roundtrip_through_display() {
        for sev in [
            Severity::Note,
            Severity::Remark,
            Severity::Warning,
            Severity::Error,
            Severity::Fatal,
        ] {
            assert_eq!(Severity::from_label(&sev.to_string()), Some(sev));
        }
        assert_eq!(Severity::from_label("bogus"), None);
    }
}
