//! Host-side plumbing for the CLI.

use std::io::Write;

use ember_build::{HostChannel, HostEvent};
use parking_lot::Mutex;
use tracing::{debug, error, info};

/// Writes each event as one JSON line.
pub struct JsonLinesHost<W> {
    out: Mutex<W>,
}

impl<W: Write> JsonLinesHost<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send + 'static> HostChannel for JsonLinesHost<W> {
    fn send(&self, event: HostEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!("cannot encode host event: {e}");
                return;
            }
        };
        let mut out = self.out.lock();
        if writeln!(out, "{line}").and_then(|()| out.flush()).is_err() {
            debug!("host output closed, event dropped");
        }
    }
}

/// Logs an event received by a one-shot command.
pub fn log_event(event: &HostEvent) {
    match event {
        HostEvent::BuildFailed { file, diagnostics } => {
            debug!(file = %file.display(), errors = diagnostics.len(), "build failed");
        }
        HostEvent::ActivityList { items } if items.is_empty() => debug!("idle"),
        HostEvent::ActivityList { items } => debug!("busy: {}", items.join(", ")),
        HostEvent::Launched => info!("program launched"),
        HostEvent::Pong => debug!("pong"),
    }
}
