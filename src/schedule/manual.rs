//! Manual executor: a virtual clock advanced explicitly.
//!
//! Lets the whole playback timeline run deterministically without sleeping:
//! tests schedule work, then call [`ManualExecutor::advance`] and observe
//! exactly which tasks fired and at what virtual time.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::queue::DeadlineQueue;
use super::{Executor, Task};

struct ManualState {
    now: Duration,
    queue: DeadlineQueue<Duration>,
}

/// An executor whose clock only moves when told to.
pub struct ManualExecutor {
    state: Mutex<ManualState>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                queue: DeadlineQueue::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of tasks still waiting.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lock().queue.next_deadline()
    }

    /// Advance the clock by `by`, running every task that comes due.
    pub fn advance(&self, by: Duration) {
        let target = self.now().saturating_add(by);
        self.advance_to(target);
    }

    /// Run tasks that are already due without moving the clock.
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    /// Advance the clock to `target`, running every task due by then.
    ///
    /// The clock is set to each task's deadline before it runs, so follow-up
    /// work it schedules is timed from that deadline. The state lock is never
    /// held while a task runs.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut state = self.lock();
                match state.queue.pop_due(target) {
                    Some((deadline, task)) => {
                        state.now = state.now.max(deadline);
                        task
                    }
                    None => {
                        state.now = state.now.max(target);
                        return;
                    }
                }
            };
            task();
        }
    }

    /// Run until nothing is left, returning the final virtual time.
    pub fn run_until_idle(&self) -> Duration {
        while let Some(deadline) = self.next_deadline() {
            self.advance_to(deadline);
        }
        self.now()
    }
}

impl Default for ManualExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ManualExecutor {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.lock();
        let deadline = state.now.saturating_add(delay);
        state.queue.push(deadline, task);
    }
}
