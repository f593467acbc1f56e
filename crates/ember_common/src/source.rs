//! Source unit identity and extension-based classification.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of a source file, derived from its extension.
///
/// The kind decides both whether a file is compiled at all and which
/// compiler driver handles it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// C translation unit (`.c`).
    C,
    /// C++ translation unit (`.cpp`, `.cc`, `.cxx`).
    Cpp,
    /// Objective-C++ translation unit (`.mm`).
    ObjCpp,
    /// Header (`.h`, `.hh`, `.hpp`, `.hxx`). Never compiled directly.
    Header,
    /// Anything else.
    Other,
}

impl SourceKind {
    /// Classifies a path by its extension, ignoring ASCII case.
    pub fn of(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return SourceKind::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "c" => SourceKind::C,
            "cpp" | "cc" | "cxx" => SourceKind::Cpp,
            "mm" => SourceKind::ObjCpp,
            "h" | "hh" | "hpp" | "hxx" => SourceKind::Header,
            _ => SourceKind::Other,
        }
    }

    /// Returns `true` for kinds that produce a translation unit.
    pub fn is_translation_unit(self) -> bool {
        matches!(self, SourceKind::C | SourceKind::Cpp | SourceKind::ObjCpp)
    }
}

/// A source file known to the engine, identified by its absolute path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUnit {
    path: PathBuf,
}

impl SourceUnit {
    /// Creates a unit for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The authoritative on-disk path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's base name, e.g. `a.cpp`. Used as the scheduler job name
    /// and as the cache key.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The base name without extension, e.g. `a` for `a.cpp`.
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The unit's kind.
    pub fn kind(&self) -> SourceKind {
        SourceKind::of(&self.path)
    }
}

impl From<PathBuf> for SourceUnit {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for SourceUnit {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}
