//! `ember run`: build the project, then link and execute it.

use std::sync::Arc;
use std::time::Duration;

use ember_build::{ChannelHost, HostEvent};
use ember_toolchain::ProgramOutput;

use crate::build::build_project;
use crate::host::log_event;
use crate::pipeline::{start_engine, Project};
use crate::GlobalArgs;

/// How long the launched program may run before the command stops waiting.
const RUN_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Runs the `ember run` command.
pub fn run(project: &Project, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (host, events) = ChannelHost::new();
    let engine = start_engine(project, Arc::new(host), ProgramOutput::Inherit)?;

    if !build_project(&engine, project, global)? {
        return Ok(1);
    }

    engine.launch();
    if !engine.wait_idle(RUN_TIMEOUT) {
        return Err("program did not finish in time".into());
    }

    let mut launched = false;
    for event in events.try_iter() {
        launched |= event == HostEvent::Launched;
        log_event(&event);
    }
    if !launched {
        return Err("project is not fully compiled, nothing was launched".into());
    }
    Ok(0)
}
