//! The link-and-execute collaborator.

use crate::error::BackendError;
use crate::store::CompiledModule;

/// The result of linking every compiled module into one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedProgram {
    /// The linked intermediate representation.
    pub image: Vec<u8>,
}

/// Links compiled modules and runs the resulting program.
pub trait ExecutionBackend: Send + Sync {
    /// Links `modules` in order; the first is the base the rest merge into.
    fn link(&self, modules: &[CompiledModule]) -> Result<LinkedProgram, BackendError>;

    /// Runs the program's `main` with `args`, loading `libraries` first, and
    /// returns its exit code.
    fn run(
        &self,
        program: &LinkedProgram,
        args: &[String],
        libraries: &[String],
    ) -> Result<i32, BackendError>;
}
