//! Virtual-time task queue
//!
//! Every delayed or repeating behavior is a task in this queue. Time only
//! moves when the owner advances it, so tests can step through an animation
//! without sleeping and the previewer can feed it wall-clock time.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<T> {
    due: Duration,
    seq: u64, // Insertion order, breaks ties between equal due times
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

pub struct Scheduler<T> {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time since page load
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `task` to run `delay` after the current time
    pub fn schedule(&mut self, delay: Duration, task: T) {
        let entry = Entry {
            due: self.now + delay,
            seq: self.seq,
            task,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Due time of the earliest queued task
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(e)| e.due)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pop the next task due at or before `until`, moving the clock to its due time
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        if self.next_due()? > until {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.task)
    }

    /// Move the clock forward; never backwards
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }
}
