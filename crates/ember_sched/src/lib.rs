//! A small worker pool that runs named jobs.
//!
//! Jobs are identified by name. While a job with a given name is queued or
//! running, further submissions under that name are coalesced instead of
//! queued again. Each job runs to completion; cancellation only discards
//! queued work.

#![warn(missing_docs)]

mod scheduler;

pub use scheduler::{Job, JobHandler, JobScheduler, Submission};
