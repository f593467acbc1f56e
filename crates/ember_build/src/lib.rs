//! The incremental build orchestrator.
//!
//! [`BuildOrchestrator`] owns the content cache, the job scheduler and the
//! module store. Host requests are turned into scheduled jobs; a single
//! control thread decides what the project needs built and reports the
//! activity list. Compilation and execution are delegated to a
//! [`CompilerFrontend`] and an [`ExecutionBackend`].

#![warn(missing_docs)]

pub mod activity;
pub mod backend;
mod control;
pub mod error;
pub mod frontend;
pub mod host;
pub mod job;
pub mod orchestrator;
pub mod store;

pub use activity::activity_list;
pub use backend::{ExecutionBackend, LinkedProgram};
pub use error::{BackendError, BuildError, FrontendError};
pub use frontend::{CompileRequest, CompilerFrontend};
pub use host::{ChannelHost, HostChannel, HostEvent, HostRequest};
pub use job::BuildJob;
pub use orchestrator::{BuildOrchestrator, CompileOutcome, Dispatch, ENGINE_VERSION};
pub use store::{CompiledModule, ModuleStore};

pub use ember_cache::SourceChange;
pub use ember_sched::Submission;
