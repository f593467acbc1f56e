//! The control loop: the single thread that decides what to schedule.

use std::sync::Arc;

use crossbeam::channel::Receiver;
use ember_cache::SourceChange;
use ember_common::SourceUnit;
use ember_sched::JobScheduler;
use tracing::{debug, info};

use crate::activity::activity_list;
use crate::host::HostEvent;
use crate::job::BuildJob;
use crate::orchestrator::Engine;

/// Signals consumed by the control loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ControlEvent {
    Exit,
    CompileProject,
    UpdateActivities,
}

/// Runs until an `Exit` event arrives or every sender is gone.
///
/// The loop is idle while blocked on the channel. Once an event arrives it
/// drains everything already queued behind it as one batch; activity
/// refreshes within a batch collapse into one report at its end.
pub(crate) fn run(
    engine: Arc<Engine>,
    scheduler: Arc<JobScheduler<BuildJob>>,
    events: Receiver<ControlEvent>,
) {
    info!(project = %engine.context.project_id, "control loop started");

    'outer: while let Ok(first) = events.recv() {
        let mut refresh = false;

        for event in std::iter::once(first).chain(events.try_iter()) {
            match event {
                ControlEvent::Exit => {
                    debug!("exit requested");
                    break 'outer;
                }
                ControlEvent::CompileProject => {
                    report_activities(&engine, &scheduler);
                    build_project_if_needed(&engine, &scheduler);
                    refresh = true;
                }
                ControlEvent::UpdateActivities => refresh = true,
            }
        }

        if refresh {
            report_activities(&engine, &scheduler);
        }
    }

    info!("control loop stopped");
}

/// Queues a compile for every registered unit that has no module yet, or a
/// bare activity refresh when there is nothing to compile.
fn build_project_if_needed(engine: &Engine, scheduler: &JobScheduler<BuildJob>) {
    let units = engine.build_info.read().compile_units.clone();
    let missing: Vec<_> = {
        let state = engine.state.lock();
        units
            .into_iter()
            .filter(|unit| !state.modules.contains(unit))
            .collect()
    };

    if missing.is_empty() {
        debug!("every compile unit has a module");
        scheduler.submit(BuildJob::ReportActivity);
        return;
    }

    info!(count = missing.len(), "scheduling project compilation");
    for path in missing {
        scheduler.submit(BuildJob::Compile {
            unit: SourceUnit::new(path),
            change: SourceChange::Unchanged,
        });
    }
}

fn report_activities(engine: &Engine, scheduler: &JobScheduler<BuildJob>) {
    let items = activity_list(&scheduler.list_active());
    debug!(?items, "activity list");
    engine.host.send(HostEvent::ActivityList { items });
}
