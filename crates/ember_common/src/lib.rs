//! Shared foundational types used across the ember live-build engine.
//!
//! This crate provides content fingerprints, source unit identity and
//! classification, and the incremental text edits hosts send for unsaved
//! buffers.

#![warn(missing_docs)]

pub mod edit;
pub mod hash;
pub mod source;

pub use edit::{apply_edits, TextEdit};
pub use hash::ContentHash;
pub use source::{SourceKind, SourceUnit};
