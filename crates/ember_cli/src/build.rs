//! `ember build`: compile every unit that is not up to date.

use std::sync::Arc;
use std::time::Duration;

use ember_build::{BuildOrchestrator, ChannelHost};
use ember_config::CONFIG_FILE;
use ember_diagnostics::render_all;
use ember_toolchain::ProgramOutput;

use crate::host::log_event;
use crate::pipeline::{start_engine, Project};
use crate::GlobalArgs;

/// Upper bound on waiting for scheduled work after the synchronous build.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs the `ember build` command. Returns exit code 1 if any unit failed.
pub fn run(project: &Project, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (host, events) = ChannelHost::new();
    let engine = start_engine(project, Arc::new(host), ProgramOutput::Inherit)?;

    let succeeded = build_project(&engine, project, global)?;
    events.try_iter().for_each(|event| log_event(&event));

    Ok(if succeeded { 0 } else { 1 })
}

/// Registers the configured build and compiles it, printing diagnostics of
/// failed units. Returns whether every unit compiled.
pub fn build_project(
    engine: &BuildOrchestrator,
    project: &Project,
    global: &GlobalArgs,
) -> Result<bool, Box<dyn std::error::Error>> {
    let info = project.config.build.clone();
    if info.compile_units.is_empty() {
        let config = project.root.join(CONFIG_FILE);
        return Err(format!("no compile units listed in {}", config.display()).into());
    }

    let failures = engine.build_and_wait(info, BUILD_TIMEOUT);
    for (_, diagnostics) in &failures {
        eprint!("{}", render_all(diagnostics));
    }

    if !global.quiet {
        let units = engine.compile_units().len();
        eprintln!(
            "   Compiled {} of {units} unit(s), {} failed",
            engine.compiled_units().len(),
            failures.len()
        );
    }
    Ok(failures.is_empty())
}
