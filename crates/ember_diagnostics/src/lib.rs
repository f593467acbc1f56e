//! Compiler diagnostics reported back to the host.
//!
//! A [`Diagnostic`] carries a severity, the file it refers to, an optional
//! line/column location and the message. [`parse_compiler_output`] turns
//! clang-style compiler output into diagnostics and [`render`] formats them
//! for terminals and logs.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod parse;
pub mod render;
pub mod severity;

pub use diagnostic::{Diagnostic, Location};
pub use parse::parse_compiler_output;
pub use render::{render, render_all};
pub use severity::Severity;
