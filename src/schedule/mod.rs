//! Delayed-callback scheduling: deadline queues, sequential workers, playback gating.
//!
//! Everything the playback scheduler defers goes through an [`Executor`]:
//! a sequential timeline that runs each task once its delay has elapsed, in
//! non-decreasing deadline order. [`Worker`] runs tasks on a dedicated thread
//! against the wall clock; [`ManualExecutor`] runs them against a virtual clock
//! that tests advance explicitly.
//!
//! Scheduled work is never removed once queued. Cancellation is cooperative:
//! tasks capture a token from the [`PlaybackGate`] and check it when they fire.

pub mod gate;
pub mod manual;
pub mod queue;
pub mod worker;

pub use gate::PlaybackGate;
pub use manual::ManualExecutor;
pub use queue::DeadlineQueue;
pub use worker::Worker;

use std::time::Duration;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A sequential timeline of delayed tasks.
pub trait Executor: Send + Sync {
    /// Run `task` once `delay` has elapsed. Never blocks the caller.
    fn schedule(&self, delay: Duration, task: Task);
}
