use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, warn};

/// A unit of work the scheduler can run.
pub trait Job: Send + 'static {
    /// The deduplication key. Two jobs with the same name never coexist in
    /// the scheduler.
    fn name(&self) -> String;
}

/// Executes jobs on the worker threads.
pub trait JobHandler<J>: Send + Sync + 'static {
    /// Runs one job. A panic is caught and logged; the worker survives.
    fn run(&self, job: J);

    /// Called after a job has left the active set, whether it completed or
    /// panicked.
    fn finished(&self, _name: &str) {}
}

/// What happened to a submitted job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The job was appended to the queue.
    Queued,
    /// A job with the same name was already queued or running.
    Coalesced,
    /// The scheduler is shutting down.
    Rejected,
}

struct State<J> {
    pending: VecDeque<(String, J)>,
    running: Vec<String>,
    /// Jobs that have left `running` but whose `finished` hook is still
    /// executing.
    settling: usize,
    cancelled: bool,
}

impl<J> State<J> {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty() && self.settling == 0
    }

    fn contains(&self, name: &str) -> bool {
        self.running.iter().any(|n| n == name) || self.pending.iter().any(|(n, _)| n == name)
    }
}

struct Shared<J> {
    state: Mutex<State<J>>,
    work: Condvar,
    idle: Condvar,
    handler: Arc<dyn JobHandler<J>>,
}

/// Fixed-size worker pool with name-based deduplication.
pub struct JobScheduler<J: Job> {
    shared: Arc<Shared<J>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<J: Job> JobScheduler<J> {
    /// Starts `workers` threads (at least one) that hand jobs to `handler`.
    pub fn new(workers: usize, handler: Arc<dyn JobHandler<J>>) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: VecDeque::new(),
                running: Vec::new(),
                settling: 0,
                cancelled: false,
            }),
            work: Condvar::new(),
            idle: Condvar::new(),
            handler,
        });

        let mut handles = Vec::new();
        for index in 0..workers.max(1) {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("ember-worker-{index}"))
                .spawn(move || worker_loop(&shared))?;
            handles.push(handle);
        }
        debug!(workers = handles.len(), "scheduler started");

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
        })
    }

    /// Queues `job` unless one with the same name is already queued or
    /// running. Never blocks on job execution.
    pub fn submit(&self, job: J) -> Submission {
        let name = job.name();
        let mut state = self.shared.state.lock();
        if state.cancelled {
            debug!(job = %name, "scheduler cancelled, job rejected");
            return Submission::Rejected;
        }
        if state.contains(&name) {
            debug!(job = %name, "job already outstanding, coalesced");
            return Submission::Coalesced;
        }
        state.pending.push_back((name, job));
        self.shared.work.notify_one();
        Submission::Queued
    }

    /// Names of running jobs followed by queued jobs, in start and queue
    /// order.
    pub fn list_active(&self) -> Vec<String> {
        let state = self.shared.state.lock();
        state
            .running
            .iter()
            .cloned()
            .chain(state.pending.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Blocks until no job is queued, running or finishing, or until
    /// `timeout` elapses. Returns whether the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while !state.is_idle() {
            if self.shared.idle.wait_until(&mut state, deadline).timed_out() {
                return state.is_idle();
            }
        }
        true
    }

    /// Cancels the scheduler: queued jobs are dropped, later submissions are
    /// rejected, and running jobs get up to `timeout` to finish.
    ///
    /// Returns `true` if every worker stopped in time. Workers still busy
    /// after the timeout are detached.
    pub fn drain_and_wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.shared.state.lock();
            state.cancelled = true;
            let dropped = state.pending.len();
            state.pending.clear();
            if dropped > 0 {
                debug!(dropped, "queued jobs discarded");
            }
            self.shared.work.notify_all();
            self.shared.idle.notify_all();

            while !state.is_idle() {
                if self.shared.idle.wait_until(&mut state, deadline).timed_out() {
                    break;
                }
            }
            if !state.is_idle() {
                warn!(
                    running = ?state.running,
                    "jobs still running after {}ms, detaching workers",
                    timeout.as_millis()
                );
                self.workers.lock().clear();
                return false;
            }
        }

        for handle in self.workers.lock().drain(..) {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
        true
    }
}

impl<J: Job> Drop for JobScheduler<J> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.cancelled = true;
        state.pending.clear();
        self.shared.work.notify_all();
    }
}

fn worker_loop<J: Job>(shared: &Shared<J>) {
    loop {
        let (name, job) = {
            let mut state = shared.state.lock();
            loop {
                if state.cancelled {
                    return;
                }
                if let Some(next) = state.pending.pop_front() {
                    state.running.push(next.0.clone());
                    break next;
                }
                shared.work.wait(&mut state);
            }
        };

        debug!(job = %name, "job started");
        let outcome = catch_unwind(AssertUnwindSafe(|| shared.handler.run(job)));
        if let Err(payload) = outcome {
            error!(job = %name, "job panicked: {}", panic_message(payload.as_ref()));
        }

        {
            let mut state = shared.state.lock();
            if let Some(pos) = state.running.iter().position(|n| *n == name) {
                state.running.remove(pos);
            }
            state.settling += 1;
        }

        if catch_unwind(AssertUnwindSafe(|| shared.handler.finished(&name))).is_err() {
            error!(job = %name, "finished hook panicked");
        }

        let mut state = shared.state.lock();
        state.settling -= 1;
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Job for Named {
        fn name(&self) -> String {
            self.0.to_string()
        }
    }

    struct Noop;

    impl JobHandler<Named> for Noop {
        fn run(&self, _job: Named) {}
    }

    #[test]
    fn panic_message_variants() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u32), "unknown panic payload");
    }

    #[test]
    fn zero_workers_still_runs_jobs() {
        let sched = JobScheduler::<Named>::new(0, Arc::new(Noop)).unwrap();
        assert_eq!(sched.submit(Named("a")), Submission::Queued);
        assert!(sched.wait_idle(Duration::from_secs(5)));
    }

    #[test]
    fn submissions_after_drain_are_rejected() {
        let sched = JobScheduler::<Named>::new(1, Arc::new(Noop)).unwrap();
        assert!(sched.drain_and_wait(Duration::from_secs(5)));
        assert_eq!(sched.submit(Named("a")), Submission::Rejected);
        assert!(sched.list_active().is_empty());
    }
}
