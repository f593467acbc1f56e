//! The build orchestrator and the compile-one-file protocol.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use ember_cache::{ContentCache, Resolution, SourceChange};
use ember_common::{apply_edits, SourceUnit, TextEdit};
use ember_config::{compile_flags, BuildInfo, EngineContext};
use ember_diagnostics::{render, Diagnostic};
use ember_sched::{JobHandler, JobScheduler, Submission};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::backend::ExecutionBackend;
use crate::control::{self, ControlEvent};
use crate::error::BuildError;
use crate::frontend::{CompileRequest, CompilerFrontend};
use crate::host::{HostChannel, HostEvent, HostRequest};
use crate::job::BuildJob;
use crate::store::{CompiledModule, ModuleStore};

/// Version stamped into cached artifacts. Artifacts from other versions are
/// recompiled.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of [`BuildOrchestrator::compile_if_needed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The unit was up to date, already in the store, reused from the cache,
    /// or a header.
    NotNeeded,
    /// The unit was compiled and its module stored.
    Ok,
    /// The compiler rejected the unit. Nothing was stored.
    Error(Vec<Diagnostic>),
}

/// What the caller of [`BuildOrchestrator::handle`] should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep reading requests.
    Continue,
    /// The host asked the engine to stop.
    Quit,
}

/// Cache and module store, always locked together.
pub(crate) struct BuildState {
    pub(crate) cache: ContentCache,
    pub(crate) modules: ModuleStore,
}

/// State shared by the orchestrator, its workers and the control thread.
pub(crate) struct Engine {
    pub(crate) context: EngineContext,
    pub(crate) state: Mutex<BuildState>,
    pub(crate) build_info: RwLock<BuildInfo>,
    pub(crate) host: Arc<dyn HostChannel>,
    frontend: Box<dyn CompilerFrontend>,
    backend: Box<dyn ExecutionBackend>,
    events: Sender<ControlEvent>,
}

impl Engine {
    fn post(&self, event: ControlEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "control loop gone, event dropped");
        }
    }

    /// Resolves, reuses or compiles one unit while holding the state lock,
    /// so cache inspection, compilation and store insertion are atomic.
    fn compile_if_needed(&self, unit: &SourceUnit, change: &SourceChange) -> CompileOutcome {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let name = unit.file_name();

        // Without a usable cache entry nothing is stored, and the text of an
        // override or edit lives in a scratch file until the compiler has
        // read it.
        let mut bypassed = false;
        let mut _scratch = None;
        let resolution = match state.cache.resolve(unit, change) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(unit = %name, "cache unavailable, compiling without it: {e}");
                bypassed = true;
                if let Err(e) = state.cache.reset(unit) {
                    debug!(unit = %name, "cache entry not cleared: {e}");
                }
                match scratch_source(unit, change) {
                    Ok(Some(file)) => {
                        let cached_source = file.path().to_path_buf();
                        _scratch = Some(file);
                        Resolution::Stale { cached_source }
                    }
                    Ok(None) => Resolution::Stale {
                        cached_source: unit.path().to_path_buf(),
                    },
                    Err(e) => {
                        let diagnostics = vec![Diagnostic::error(
                            unit.path(),
                            format!("cannot prepare source for compilation: {e}"),
                        )];
                        return fail(state, unit, diagnostics);
                    }
                }
            }
        };

        let source = match resolution {
            Resolution::Header => {
                debug!(unit = %name, "header, not compiled");
                return CompileOutcome::NotNeeded;
            }
            Resolution::Ignored => {
                debug!(unit = %name, "not a source file, not compiled");
                return CompileOutcome::NotNeeded;
            }
            Resolution::Fresh { cached_source } => {
                if state.modules.contains(unit.path()) {
                    debug!(unit = %name, "up to date");
                    return CompileOutcome::NotNeeded;
                }
                if let Some(artifact) = state.cache.load_artifact(unit) {
                    info!(unit = %name, "reusing cached artifact");
                    state.modules.insert(CompiledModule::new(unit.path(), artifact));
                    return CompileOutcome::NotNeeded;
                }
                cached_source
            }
            Resolution::Stale { cached_source } => cached_source,
        };

        let flags = compile_flags(&self.build_info.read(), &self.context.toolchain, unit.path());
        info!(unit = %unit.path().display(), "compiling");
        let request = CompileRequest {
            unit,
            source: &source,
            flags: &flags,
        };

        match self.frontend.compile(&request) {
            Ok(artifact) => {
                if !bypassed {
                    if let Err(e) = state.cache.store_artifact(unit, &artifact) {
                        warn!(unit = %name, "could not cache artifact: {e}");
                    }
                }
                state.modules.insert(CompiledModule::new(unit.path(), artifact));
                info!(unit = %name, "compiled");
                CompileOutcome::Ok
            }
            Err(e) => fail(state, unit, e.into_diagnostics(unit.path())),
        }
    }

    fn clean_all(&self) {
        let mut state = self.state.lock();
        state.modules.clear();
        match state.cache.clean_all() {
            Ok(removed) => info!(removed, "cache cleaned"),
            Err(e) => error!("clean-all failed: {e}"),
        }
    }

    fn reset(&self, unit: &SourceUnit) {
        let mut state = self.state.lock();
        if let Err(e) = state.cache.reset(unit) {
            warn!(unit = %unit.file_name(), "could not reset cache entry: {e}");
        }
        state.modules.remove(unit.path());
        info!(unit = %unit.file_name(), "cache entry reset");
    }

    /// Links and runs the program once every compile unit has a module.
    fn run_app(&self) {
        let (units, libraries) = {
            let info = self.build_info.read();
            (info.compile_units.clone(), info.extra_dlls.clone())
        };

        let modules = {
            let state = self.state.lock();
            let complete = !state.modules.is_empty()
                && state.modules.len() == units.len()
                && units.iter().all(|unit| state.modules.contains(unit));
            if !complete {
                info!(
                    modules = state.modules.len(),
                    units = units.len(),
                    "launch skipped, project not fully compiled"
                );
                return;
            }
            state.modules.all().to_vec()
        };

        self.host.send(HostEvent::Launched);
        info!(modules = modules.len(), "linking");
        let program = match self.backend.link(&modules) {
            Ok(program) => program,
            Err(e) => {
                error!("link failed: {e}");
                return;
            }
        };

        match self.backend.run(&program, &["app".to_string()], &libraries) {
            Ok(0) => info!("program exited normally"),
            Ok(code) => warn!(code, "program exited with failure"),
            Err(e) => error!("could not run program: {e}"),
        }
    }
}

/// Ends a failed compile: the unit's stale module leaves the store.
fn fail(state: &mut BuildState, unit: &SourceUnit, diagnostics: Vec<Diagnostic>) -> CompileOutcome {
    if state.modules.remove(unit.path()).is_some() {
        debug!(unit = %unit.file_name(), "stale module evicted");
    }
    warn!(unit = %unit.file_name(), errors = diagnostics.len(), "compilation failed");
    CompileOutcome::Error(diagnostics)
}

/// Writes the text described by `change` to a temporary file. Returns
/// `None` when the change is the file on disk.
fn scratch_source(
    unit: &SourceUnit,
    change: &SourceChange,
) -> std::io::Result<Option<tempfile::NamedTempFile>> {
    let text = match change {
        SourceChange::Unchanged => return Ok(None),
        SourceChange::Edits(edits) if edits.is_empty() => return Ok(None),
        SourceChange::Override(text) => text.clone().into_bytes(),
        SourceChange::Edits(edits) => apply_edits(&std::fs::read(unit.path())?, edits),
    };
    let mut file = tempfile::Builder::new()
        .prefix("ember-")
        .suffix(&format!("-{}", unit.file_name()))
        .tempfile()?;
    file.write_all(&text)?;
    file.flush()?;
    Ok(Some(file))
}

/// Runs jobs on the scheduler's workers.
struct Worker {
    engine: Arc<Engine>,
}

impl JobHandler<BuildJob> for Worker {
    fn run(&self, job: BuildJob) {
        match job {
            BuildJob::Compile { unit, change } => {
                if let CompileOutcome::Error(diagnostics) = self.engine.compile_if_needed(&unit, &change) {
                    for diagnostic in &diagnostics {
                        error!("{}", render(diagnostic));
                    }
                    self.engine.host.send(HostEvent::BuildFailed {
                        file: unit.path().to_path_buf(),
                        diagnostics: diagnostics.into_iter().filter(Diagnostic::is_error).collect(),
                    });
                }
            }
            BuildJob::CleanAll => self.engine.clean_all(),
            BuildJob::Run => self.engine.run_app(),
            BuildJob::Reset(unit) => self.engine.reset(&unit),
            BuildJob::ReportActivity => {}
        }
    }

    fn finished(&self, _name: &str) {
        self.engine.post(ControlEvent::UpdateActivities);
    }
}

/// The live build engine for one project.
///
/// Host-facing methods never wait for compilation: they queue jobs and
/// return. Results reach the host through its [`HostChannel`].
pub struct BuildOrchestrator {
    engine: Arc<Engine>,
    scheduler: Arc<JobScheduler<BuildJob>>,
    control: Option<JoinHandle<()>>,
    control_done: Receiver<()>,
}

impl BuildOrchestrator {
    /// Opens the project cache, starts the workers and the control thread.
    pub fn new(
        context: EngineContext,
        frontend: Box<dyn CompilerFrontend>,
        backend: Box<dyn ExecutionBackend>,
        host: Arc<dyn HostChannel>,
    ) -> Result<Self, BuildError> {
        let cache = ContentCache::open(&context.cache_dir, ENGINE_VERSION)?;
        let (events_tx, events_rx) = unbounded();
        let workers = context.engine.workers;

        let engine = Arc::new(Engine {
            context,
            state: Mutex::new(BuildState {
                cache,
                modules: ModuleStore::new(),
            }),
            build_info: RwLock::new(BuildInfo::default()),
            host,
            frontend,
            backend,
            events: events_tx,
        });

        let worker = Arc::new(Worker {
            engine: Arc::clone(&engine),
        });
        let scheduler = Arc::new(
            JobScheduler::<BuildJob>::new(workers, worker).map_err(|source| BuildError::Spawn {
                what: "worker",
                source,
            })?,
        );

        let (done_tx, done_rx) = bounded(1);
        let control = {
            let engine = Arc::clone(&engine);
            let scheduler = Arc::clone(&scheduler);
            std::thread::Builder::new()
                .name("ember-control".to_string())
                .spawn(move || {
                    control::run(engine, scheduler, events_rx);
                    let _ = done_tx.send(());
                })
                .map_err(|source| BuildError::Spawn {
                    what: "control",
                    source,
                })?
        };

        info!(
            project = %engine.context.project_id,
            cache = %engine.context.cache_dir.display(),
            workers,
            "build orchestrator started"
        );

        Ok(Self {
            engine,
            scheduler,
            control: Some(control),
            control_done: done_rx,
        })
    }

    /// Replaces the build settings and registered files, then schedules
    /// compilation of every unit that has no module.
    ///
    /// Files that do not exist are dropped, as are duplicates.
    pub fn set_build_info(&self, mut info: BuildInfo) {
        info.retain_existing();
        info!(
            units = info.compile_units.len(),
            user_files = info.user_files.len(),
            "build info updated"
        );
        *self.engine.build_info.write() = info;
        self.engine.post(ControlEvent::CompileProject);
    }

    /// A file was saved, or its unsaved buffer is supplied in `text`.
    pub fn file_updated(&self, path: impl Into<PathBuf>, text: Option<String>) -> Submission {
        let change = text.map_or(SourceChange::Unchanged, SourceChange::Override);
        self.submit_for(path, |unit| BuildJob::Compile { unit, change })
    }

    /// The host edited a file; `edits` apply to its on-disk content in order.
    pub fn file_changed(&self, path: impl Into<PathBuf>, edits: Vec<TextEdit>) -> Submission {
        let change = SourceChange::from_edits(edits);
        self.submit_for(path, |unit| BuildJob::Compile { unit, change })
    }

    /// Drops the cached snapshot, artifact and module of one file.
    pub fn file_reset(&self, path: impl Into<PathBuf>) -> Submission {
        self.submit_for(path, BuildJob::Reset)
    }

    /// Drops every cached file and compiled module.
    pub fn clean_all(&self) -> Submission {
        self.submit(BuildJob::CleanAll)
    }

    /// Links and runs the program once the whole project is compiled.
    pub fn launch(&self) -> Submission {
        self.submit(BuildJob::Run)
    }

    /// Answers a ping.
    pub fn ping(&self) {
        self.engine.host.send(HostEvent::Pong);
    }

    /// Dispatches one host request.
    pub fn handle(&self, request: HostRequest) -> Dispatch {
        match request {
            HostRequest::BuildInfo(info) => self.set_build_info(info),
            HostRequest::FileUpdated { file, text } => {
                self.file_updated(file, text);
            }
            HostRequest::FileChanged { file, changes } => {
                self.file_changed(file, changes);
            }
            HostRequest::FileReset { file } => {
                self.file_reset(file);
            }
            HostRequest::CleanAll => {
                self.clean_all();
            }
            HostRequest::Reload => debug!("reload requested, nothing to do"),
            HostRequest::Launch => {
                self.launch();
            }
            HostRequest::Foreground { parent_active } => debug!(parent_active, "foreground change"),
            HostRequest::Ping => self.ping(),
            HostRequest::Quit => {
                info!("quit requested");
                return Dispatch::Quit;
            }
        }
        Dispatch::Continue
    }

    /// Runs the compile-one-file protocol on the calling thread.
    ///
    /// Serialized against scheduled jobs by the state lock. Triggers an
    /// activity refresh like a scheduled compile does.
    pub fn compile_if_needed(&self, path: impl Into<PathBuf>, change: SourceChange) -> CompileOutcome {
        let outcome = self
            .engine
            .compile_if_needed(&SourceUnit::new(path), &change);
        self.engine.post(ControlEvent::UpdateActivities);
        outcome
    }

    /// Sources with a compiled module, in link order.
    pub fn compiled_units(&self) -> Vec<PathBuf> {
        self.engine
            .state
            .lock()
            .modules
            .all()
            .iter()
            .map(|m| m.source.clone())
            .collect()
    }

    /// Returns `true` if a module built from `path` is in the store.
    pub fn is_compiled(&self, path: &Path) -> bool {
        self.engine.state.lock().modules.contains(path)
    }

    /// The registered compile units.
    pub fn compile_units(&self) -> Vec<PathBuf> {
        self.engine.build_info.read().compile_units.clone()
    }

    /// Names of running and queued jobs.
    pub fn active_jobs(&self) -> Vec<String> {
        self.scheduler.list_active()
    }

    /// The project cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.engine.context.cache_dir
    }

    /// Blocks until no job is queued or running, up to `timeout`.
    ///
    /// Jobs queued by the control thread after this returns are not waited
    /// for; callers that just registered build info should give the control
    /// thread a chance to schedule first (see [`Self::build_and_wait`]).
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.scheduler.wait_idle(timeout)
    }

    /// Registers `info`, compiles every unit and waits for the scheduler to
    /// go idle. Returns the diagnostics of every failed unit.
    ///
    /// Intended for one-shot command-line builds, where there is no host to
    /// receive events.
    pub fn build_and_wait(&self, mut info: BuildInfo, timeout: Duration) -> Vec<(PathBuf, Vec<Diagnostic>)> {
        info.retain_existing();
        let units = info.compile_units.clone();
        *self.engine.build_info.write() = info;

        let mut failures = Vec::new();
        for unit in units {
            if let CompileOutcome::Error(diagnostics) = self.compile_if_needed(unit.clone(), SourceChange::Unchanged) {
                failures.push((unit, diagnostics));
            }
        }
        self.wait_idle(timeout);
        failures
    }

    /// Stops the engine: queued jobs are dropped, running jobs get the
    /// configured grace period, then the control thread is stopped.
    ///
    /// Returns `true` if everything stopped in time. Idempotent.
    pub fn shutdown(&mut self) -> bool {
        let Some(control) = self.control.take() else {
            return true;
        };
        let config = &self.engine.context.engine;

        let drained = self
            .scheduler
            .drain_and_wait(Duration::from_millis(config.shutdown_grace_ms));
        self.engine.post(ControlEvent::Exit);

        let joined = match self
            .control_done
            .recv_timeout(Duration::from_millis(config.control_join_ms))
        {
            Ok(()) => {
                if control.join().is_err() {
                    error!("control thread panicked");
                }
                true
            }
            Err(_) => {
                warn!("control thread did not stop in time, detaching");
                false
            }
        };

        info!(drained, joined, "build orchestrator stopped");
        drained && joined
    }

    /// Rejects paths without a file name, which have no cache entry.
    fn submit_for(
        &self,
        path: impl Into<PathBuf>,
        job: impl FnOnce(SourceUnit) -> BuildJob,
    ) -> Submission {
        let unit = SourceUnit::new(path);
        if unit.path().file_name().is_none() {
            warn!(path = %unit.path().display(), "request without a file name rejected");
            return Submission::Rejected;
        }
        self.submit(job(unit))
    }

    fn submit(&self, job: BuildJob) -> Submission {
        let submission = self.scheduler.submit(job);
        self.engine.post(ControlEvent::UpdateActivities);
        submission
    }
}

impl Drop for BuildOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
