//! The native compiler collaborator.

use std::path::Path;

use ember_common::SourceUnit;

use crate::error::FrontendError;

/// One compilation handed to the frontend.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// The unit being compiled. Its kind selects the language and its path
    /// is what diagnostics are reported against.
    pub unit: &'a SourceUnit,
    /// The file to read, normally the unit's cached snapshot.
    pub source: &'a Path,
    /// Include paths, defines and extra flags for this unit.
    pub flags: &'a [String],
}

/// Translates source files into serialized intermediate representation.
///
/// Implementations are called from scheduler workers, one compilation at a
/// time per orchestrator.
pub trait CompilerFrontend: Send + Sync {
    /// Compiles `request.source` and returns the artifact bytes.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>, FrontendError>;
}
