//! Sequential worker: a dedicated thread draining a deadline queue.
//!
//! Tasks arrive over an mpsc inbox stamped with their absolute deadline. The
//! thread sleeps in `recv_timeout` until either a new task arrives or the
//! earliest deadline passes, then runs every due task in order. A task that
//! panics is logged and the worker carries on with the next one.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use super::queue::DeadlineQueue;
use super::{Executor, Task};

/// How long an idle worker sleeps before re-checking its stop flag.
const IDLE_POLL: Duration = Duration::from_millis(50);

struct Job {
    deadline: Instant,
    task: Task,
}

/// A named thread running scheduled tasks against the wall clock.
pub struct Worker {
    name: String,
    inbox: Mutex<mpsc::Sender<Job>>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread with the given name.
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let thread_name = name.to_string();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(&thread_name, rx, &stop_clone))?;

        Ok(Self {
            name: name.to_string(),
            inbox: Mutex::new(tx),
            stop_flag,
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn run(name: &str, rx: mpsc::Receiver<Job>, stop_flag: &AtomicBool) {
    let mut queue: DeadlineQueue<Instant> = DeadlineQueue::new();
    debug!(worker = name, "worker started");

    while !stop_flag.load(Ordering::Relaxed) {
        let timeout = queue
            .next_deadline()
            .map(|d| d.saturating_duration_since(Instant::now()).min(IDLE_POLL))
            .unwrap_or(IDLE_POLL);

        match rx.recv_timeout(timeout) {
            Ok(job) => queue.push(job.deadline, job.task),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if queue.is_empty() {
                    break;
                }
                thread::sleep(timeout);
            }
        }
        while let Ok(job) = rx.try_recv() {
            queue.push(job.deadline, job.task);
        }

        let now = Instant::now();
        while let Some((_, task)) = queue.pop_due(now) {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                error!(worker = name, "scheduled task panicked");
            }
        }
    }

    if !queue.is_empty() {
        debug!(worker = name, pending = queue.len(), "worker stopped with pending tasks");
    }
}

impl Executor for Worker {
    fn schedule(&self, delay: Duration, task: Task) {
        // A deadline past the end of `Instant` can never come due.
        let Some(deadline) = Instant::now().checked_add(delay) else {
            debug!(worker = %self.name, ?delay, "task beyond the clock range dropped");
            return;
        };
        let job = Job { deadline, task };
        let inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
        if inbox.send(job).is_err() {
            warn!(worker = %self.name, "worker thread has exited; task dropped");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            // The last handle can be released by a task running on this worker.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
