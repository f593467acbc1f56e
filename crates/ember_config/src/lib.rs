//! Engine configuration: the `ember.toml` project file, the host's
//! build-info payload and compiler flag assembly.
//!
//! [`EngineContext`] replaces process-wide settings: everything the
//! orchestrator needs about the project, the engine and the toolchain is
//! handed to it at construction.

#![warn(missing_docs)]

pub mod error;
pub mod flags;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use flags::compile_flags;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
