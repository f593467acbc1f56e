//! Compiler frontend and execution backend built on the clang/LLVM command
//! line tools.
//!
//! [`ClangFrontend`] compiles a unit to LLVM bitcode with `clang`/`clang++`
//! and turns the compiler's error output into diagnostics. [`LlvmBackend`]
//! merges bitcode modules with `llvm-link` and runs the result with `lli`.

#![warn(missing_docs)]

mod clang;
mod llvm;

pub use clang::ClangFrontend;
pub use llvm::{LlvmBackend, ProgramOutput};
