//! # Bounded Queue
//! Fixed-capacity FIFO used for pushed server records and the ping log.
//!
//! When full, a push drops the oldest entry instead of rejecting the new one.
//! All operations take the same mutex, so a snapshot always reflects a single
//! point in time even while request handlers push concurrently.

use std::{collections::VecDeque, sync::Mutex};

/// Thread-safe FIFO with overwrite-oldest eviction.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    cap: usize,
}

impl<T: Clone> BoundedQueue<T> {
    /// Create a queue holding at most `cap` records (a zero cap is bumped to 1).
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(10_000))),
            cap,
        }
    }

    /// Append to the tail, evicting the head first when full.
    /// Returns the queue size after the insert.
    pub fn push(&self, item: T) -> usize {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        if q.len() >= self.cap {
            q.pop_front();
        }
        q.push_back(item);
        q.len()
    }

    /// Remove and return the oldest record, if any.
    pub fn pop_front(&self) -> Option<T> {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        q.pop_front()
    }

    /// Like `pop_front`, but also reports how many records remain.
    pub fn pop_front_with_len(&self) -> (Option<T>, usize) {
        let mut q = self.inner.lock().expect("queue mutex poisoned");
        let item = q.pop_front();
        (item, q.len())
    }

    /// Copy of all records, oldest first. Does not remove anything.
    pub fn snapshot(&self) -> Vec<T> {
        let q = self.inner.lock().expect("queue mutex poisoned");
        q.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}
