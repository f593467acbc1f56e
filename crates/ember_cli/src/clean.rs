//! `ember clean`: remove every cached snapshot and artifact.

use std::sync::Arc;
use std::time::Duration;

use ember_build::ChannelHost;
use ember_toolchain::ProgramOutput;

use crate::pipeline::{start_engine, Project};
use crate::GlobalArgs;

/// Runs the `ember clean` command.
pub fn run(project: &Project, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (host, _events) = ChannelHost::new();
    let engine = start_engine(project, Arc::new(host), ProgramOutput::Inherit)?;

    engine.clean_all();
    if !engine.wait_idle(Duration::from_secs(60)) {
        return Err("clean did not finish in time".into());
    }

    if !global.quiet {
        eprintln!("   Cleaned {}", engine.cache_dir().display());
    }
    Ok(0)
}
