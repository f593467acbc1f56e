//! `ember serve`: the host protocol over stdin/stdout.
//!
//! Each stdin line is one JSON [`HostRequest`]; each stdout line is one JSON
//! [`HostEvent`](ember_build::HostEvent). The program's own output goes to
//! stderr so it cannot corrupt the event stream.

use std::io::BufRead;
use std::sync::Arc;

use ember_build::{BuildOrchestrator, Dispatch, HostRequest};
use ember_toolchain::ProgramOutput;
use tracing::{info, warn};

use crate::host::JsonLinesHost;
use crate::pipeline::{start_engine, Project};

/// Runs the `ember serve` command until `quit` or end of input.
pub fn run(project: &Project) -> Result<i32, Box<dyn std::error::Error>> {
    let host = JsonLinesHost::new(std::io::stdout());
    let mut engine = start_engine(project, Arc::new(host), ProgramOutput::Stderr)?;

    if !project.config.build.compile_units.is_empty() {
        engine.set_build_info(project.config.build.clone());
    }

    let handled = serve_lines(&engine, std::io::stdin().lock())?;
    info!(handled, "host session ended");
    engine.shutdown();
    Ok(0)
}

/// Dispatches requests read from `input` until `quit` or end of input.
/// Returns the number of requests handled. Malformed lines are skipped.
pub fn serve_lines(
    engine: &BuildOrchestrator,
    input: impl BufRead,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut handled = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: HostRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!("ignoring malformed request: {e}");
                continue;
            }
        };
        handled += 1;
        if engine.handle(request) == Dispatch::Quit {
            break;
        }
    }
    Ok(handled)
}
