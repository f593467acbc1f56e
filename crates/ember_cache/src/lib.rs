//! Content-verified cache of source snapshots and compiled artifacts.
//!
//! For every source file the cache directory holds the verbatim bytes that
//! were last handed to the compiler and the artifact that compilation
//! produced. Staleness is decided by comparing content fingerprints of the
//! snapshot and the authoritative file, never by timestamps. Artifact reads
//! are fail-safe: corruption or a version mismatch is a cache miss.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod error;
pub mod hasher;

pub use artifact::{ArtifactFile, ArtifactHeader};
pub use cache::{ContentCache, Resolution, SourceChange, LOG_FILE};
pub use error::CacheError;
pub use hasher::SourceHasher;
