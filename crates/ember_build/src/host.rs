//! Messages exchanged with the host and the channel they travel on.

use std::path::PathBuf;

use crossbeam::channel::{unbounded, Receiver, Sender};
use ember_common::TextEdit;
use ember_config::BuildInfo;
use ember_diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Events the engine sends to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A compile job failed.
    BuildFailed {
        /// The unit that failed.
        file: PathBuf,
        /// Compiler diagnostics in the order reported.
        diagnostics: Vec<Diagnostic>,
    },
    /// The current list of pending and running work.
    ActivityList {
        /// User-facing labels in execution order.
        items: Vec<String>,
    },
    /// The program is about to be linked and started.
    Launched,
    /// Reply to a ping.
    Pong,
}

/// Requests the host sends to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Replace the project's build settings and registered files.
    BuildInfo(BuildInfo),
    /// A file was saved, or its unsaved buffer is supplied as `text`.
    FileUpdated {
        /// The file.
        file: PathBuf,
        /// Full buffer contents, when unsaved.
        #[serde(default)]
        text: Option<String>,
    },
    /// Incremental edits against the file on disk.
    FileChanged {
        /// The file.
        file: PathBuf,
        /// Edits in application order.
        #[serde(default)]
        changes: Vec<TextEdit>,
    },
    /// Forget the cached state of one file.
    FileReset {
        /// The file.
        file: PathBuf,
    },
    /// Wipe the cache and every compiled module.
    CleanAll,
    /// Reload components. Accepted and ignored.
    Reload,
    /// Link and run the program.
    Launch,
    /// The host moved to the foreground or background. Accepted and ignored.
    Foreground {
        /// Whether the host's window is active.
        #[serde(default)]
        parent_active: bool,
    },
    /// Liveness check.
    Ping,
    /// Stop serving.
    Quit,
}

/// Delivers events to the host. Sending never blocks on the host.
pub trait HostChannel: Send + Sync {
    /// Sends one event.
    fn send(&self, event: HostEvent);
}

/// A host channel backed by an unbounded crossbeam channel.
#[derive(Clone)]
pub struct ChannelHost {
    tx: Sender<HostEvent>,
}

impl ChannelHost {
    /// Creates the channel and returns the receiving end.
    pub fn new() -> (Self, Receiver<HostEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl HostChannel for ChannelHost {
    fn send(&self, event: HostEvent) {
        if self.tx.send(event).is_err() {
            debug!("host receiver dropped, event discarded");
        }
    }
}
