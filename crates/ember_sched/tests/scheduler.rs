use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};
use ember_sched::{Job, JobHandler, JobScheduler, Submission};
use parking_lot::Mutex;

const WAIT: Duration = Duration::from_secs(10);

/// A job that optionally blocks until released.
struct TestJob {
    name: String,
    gate: Option<Receiver<()>>,
    panics: bool,
}

impl TestJob {
    fn quick(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gate: None,
            panics: false,
        }
    }

    fn gated(name: &str) -> (Self, Sender<()>) {
        let (tx, rx) = unbounded();
        let job = Self {
            name: name.to_string(),
            gate: Some(rx),
            panics: false,
        };
        (job, tx)
    }
}

impl Job for TestJob {
    fn name(&self) -> String {
        self.name.clone()
    }
}

#[derive(Default)]
struct Recorder {
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    runs: AtomicUsize,
    started_tx: Mutex<Option<Sender<String>>>,
}

impl JobHandler<TestJob> for Recorder {
    fn run(&self, job: TestJob) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.started.lock().push(job.name.clone());
        if let Some(tx) = self.started_tx.lock().as_ref() {
            let _ = tx.send(job.name.clone());
        }
        if let Some(gate) = &job.gate {
            let _ = gate.recv();
        }
        if job.panics {
            panic!("job {} failed", job.name);
        }
    }

    fn finished(&self, name: &str) {
        self.finished.lock().push(name.to_string());
    }
}

fn recorder_with_start_signal() -> (Arc<Recorder>, Receiver<String>) {
    let (tx, rx) = unbounded();
    let recorder = Recorder::default();
    *recorder.started_tx.lock() = Some(tx);
    (Arc::new(recorder), rx)
}

#[test]
fn runs_jobs_in_submission_order() {
    let recorder = Arc::new(Recorder::default());
    let sched = JobScheduler::<TestJob>::new(1, recorder.clone()).unwrap();
    for name in ["a.cpp", "b.cpp", "c.cpp"] {
        assert_eq!(sched.submit(TestJob::quick(name)), Submission::Queued);
    }
    assert!(sched.wait_idle(WAIT));
    assert_eq!(*recorder.started.lock(), vec!["a.cpp", "b.cpp", "c.cpp"]);
    assert_eq!(*recorder.finished.lock(), vec!["a.cpp", "b.cpp", "c.cpp"]);
}

#[test]
fn duplicate_name_is_coalesced_while_running() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder.clone()).unwrap();

    let (job, release) = TestJob::gated("a.cpp");
    assert_eq!(sched.submit(job), Submission::Queued);
    assert_eq!(started.recv_timeout(WAIT).unwrap(), "a.cpp");

    assert_eq!(sched.submit(TestJob::quick("a.cpp")), Submission::Coalesced);
    assert_eq!(sched.list_active(), vec!["a.cpp"]);

    release.send(()).unwrap();
    assert!(sched.wait_idle(WAIT));
    assert_eq!(recorder.runs.load(Ordering::SeqCst), 1);
    assert!(sched.list_active().is_empty());

    // Once finished, the name is free again.
    assert_eq!(sched.submit(TestJob::quick("a.cpp")), Submission::Queued);
    assert!(sched.wait_idle(WAIT));
    assert_eq!(recorder.runs.load(Ordering::SeqCst), 2);
}

#[test]
fn duplicate_name_is_coalesced_while_queued() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder.clone()).unwrap();

    let (blocker, release) = TestJob::gated("__clean");
    sched.submit(blocker);
    started.recv_timeout(WAIT).unwrap();

    assert_eq!(sched.submit(TestJob::quick("b.cpp")), Submission::Queued);
    assert_eq!(sched.submit(TestJob::quick("b.cpp")), Submission::Coalesced);

    release.send(()).unwrap();
    assert!(sched.wait_idle(WAIT));
    assert_eq!(*recorder.started.lock(), vec!["__clean", "b.cpp"]);
}

#[test]
fn list_active_reports_running_then_pending() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder).unwrap();

    let (job, release) = TestJob::gated("a.cpp");
    sched.submit(job);
    started.recv_timeout(WAIT).unwrap();
    sched.submit(TestJob::quick("b.cpp"));
    sched.submit(TestJob::quick("__activity"));

    assert_eq!(sched.list_active(), vec!["a.cpp", "b.cpp", "__activity"]);

    release.send(()).unwrap();
    assert!(sched.wait_idle(WAIT));
    assert!(sched.list_active().is_empty());
}

#[test]
fn panicking_job_does_not_stop_the_pool() {
    let recorder = Arc::new(Recorder::default());
    let sched = JobScheduler::<TestJob>::new(1, recorder.clone()).unwrap();

    let mut bad = TestJob::quick("bad.cpp");
    bad.panics = true;
    sched.submit(bad);
    sched.submit(TestJob::quick("good.cpp"));

    assert!(sched.wait_idle(WAIT));
    assert_eq!(*recorder.started.lock(), vec!["bad.cpp", "good.cpp"]);
    assert_eq!(*recorder.finished.lock(), vec!["bad.cpp", "good.cpp"]);
}

#[test]
fn drain_discards_queue_and_waits_for_running() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder.clone()).unwrap();

    let (job, release) = TestJob::gated("a.cpp");
    sched.submit(job);
    started.recv_timeout(WAIT).unwrap();
    sched.submit(TestJob::quick("b.cpp"));

    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        release.send(()).unwrap();
    });
    assert!(sched.drain_and_wait(WAIT));
    releaser.join().unwrap();

    assert_eq!(*recorder.started.lock(), vec!["a.cpp"]);
    assert_eq!(sched.submit(TestJob::quick("c.cpp")), Submission::Rejected);
}

#[test]
fn drain_times_out_on_stuck_job() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder).unwrap();

    let (job, release) = TestJob::gated("stuck.cpp");
    sched.submit(job);
    started.recv_timeout(WAIT).unwrap();

    assert!(!sched.drain_and_wait(Duration::from_millis(50)));
    // Let the detached worker exit.
    release.send(()).unwrap();
}

#[test]
fn wait_idle_times_out_while_busy() {
    let (recorder, started) = recorder_with_start_signal();
    let sched = JobScheduler::<TestJob>::new(1, recorder).unwrap();

    let (job, release) = TestJob::gated("a.cpp");
    sched.submit(job);
    started.recv_timeout(WAIT).unwrap();

    assert!(!sched.wait_idle(Duration::from_millis(20)));
    release.send(()).unwrap();
    assert!(sched.wait_idle(WAIT));
}

#[test]
fn finished_hook_sees_job_removed() {
    struct Observer {
        sched: Mutex<Option<Arc<JobScheduler<TestJob>>>>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl JobHandler<TestJob> for Observer {
        fn run(&self, _job: TestJob) {}

        fn finished(&self, _name: &str) {
            if let Some(sched) = self.sched.lock().as_ref() {
                self.seen.lock().push(sched.list_active());
            }
        }
    }

    let observer = Arc::new(Observer {
        sched: Mutex::new(None),
        seen: Mutex::new(Vec::new()),
    });
    let sched = Arc::new(JobScheduler::<TestJob>::new(1, observer.clone()).unwrap());
    *observer.sched.lock() = Some(sched.clone());

    sched.submit(TestJob::quick("a.cpp"));
    assert!(sched.wait_idle(WAIT));
    assert_eq!(*observer.seen.lock(), vec![Vec::<String>::new()]);

    // Break the cycle so the scheduler can drop.
    observer.sched.lock().take();
}
