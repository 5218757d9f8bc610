//! Deadline-ordered task storage.
//!
//! Tasks pop in non-decreasing deadline order. A submission sequence number
//! breaks ties so tasks sharing a deadline run in the order they were queued.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::Task;

struct Entry<D> {
    deadline: D,
    seq: u64,
    task: Task,
}

impl<D: Ord> PartialEq for Entry<D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<D: Ord> Eq for Entry<D> {}

impl<D: Ord> PartialOrd for Entry<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<D: Ord> Ord for Entry<D> {
    // Reversed: BinaryHeap is a max-heap and we want the earliest entry on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A queue of tasks keyed by deadline.
pub struct DeadlineQueue<D> {
    heap: BinaryHeap<Entry<D>>,
    next_seq: u64,
}

impl<D: Ord + Copy> DeadlineQueue<D> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Queue a task to run at `deadline`.
    pub fn push(&mut self, deadline: D, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline,
            seq,
            task,
        });
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<D> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Pop the earliest task if its deadline is at or before `now`.
    pub fn pop_due(&mut self, now: D) -> Option<(D, Task)> {
        if self.heap.peek()?.deadline > now {
            return None;
        }
        self.heap.pop().map(|e| (e.deadline, e.task))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<D: Ord + Copy> Default for DeadlineQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}
