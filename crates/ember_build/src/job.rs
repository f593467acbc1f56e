//! Scheduled work items.

use ember_cache::SourceChange;
use ember_common::SourceUnit;
use ember_sched::Job;

/// Name of the clean-all job.
pub const CLEAN_JOB: &str = "__clean";
/// Name of the run job.
pub const RUN_JOB: &str = "__run";
/// Name of the activity refresh job.
pub const ACTIVITY_JOB: &str = "__activity";

/// Work executed on the scheduler's workers.
///
/// Housekeeping jobs carry names starting with `__`, which keeps them out of
/// the activity list.
#[derive(Debug)]
pub enum BuildJob {
    /// Compile one unit, optionally with new content from the host.
    Compile {
        /// The unit to compile.
        unit: SourceUnit,
        /// Unsaved content supplied with the request.
        change: SourceChange,
    },
    /// Empty the cache and the module store.
    CleanAll,
    /// Link the compiled modules and execute the program.
    Run,
    /// Forget one unit's cache entry and module.
    Reset(SourceUnit),
    /// Refresh the activity list once the queue reaches this point.
    ReportActivity,
}

impl Job for BuildJob {
    fn name(&self) -> String {
        match self {
            BuildJob::Compile { unit, .. } => unit.file_name(),
            BuildJob::CleanAll => CLEAN_JOB.to_string(),
            BuildJob::Run => RUN_JOB.to_string(),
            BuildJob::Reset(unit) => format!("__reset {}", unit.file_name()),
            BuildJob::ReportActivity => ACTIVITY_JOB.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_jobs_are_named_by_base_name() {
        let job = BuildJob::Compile {
            unit: SourceUnit::new("/project/src/a.cpp"),
            change: SourceChange::Unchanged,
        };
        assert_eq!(job.name(), "a.cpp");
    }

    #[test]
    fn housekeeping_names_are_tagged() {
        for job in [
            BuildJob::CleanAll,
            BuildJob::Run,
            BuildJob::ReportActivity,
            BuildJob::Reset(SourceUnit::new("/p/a.cpp")),
        ] {
            assert!(job.name().starts_with("__"), "{}", job.name());
        }
    }

    #[test]
    fn reset_does_not_collide_with_compile() {
        let unit = SourceUnit::new("/p/a.cpp");
        let compile = BuildJob::Compile {
            unit: unit.clone(),
            change: SourceChange::Unchanged,
        };
        assert_ne!(compile.name(), BuildJob::Reset(unit).name());
    }
}
