//! Strict FIFO ready queue
//!
//! Design:
//! - `VecDeque` of ids in run order
//! - A presence flag per id, so the "never queued twice" check is O(1)
//!   instead of a scan

use super::ReadyQueue;
use cothread_core::id::ThreadId;

use std::collections::VecDeque;

/// FIFO queue of runnable thread ids
#[derive(Debug, Default)]
pub struct FifoQueue {
    queue: VecDeque<ThreadId>,
    present: Vec<bool>,
}

impl FifoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for ids below `capacity` without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            present: vec![false; capacity],
        }
    }

    #[inline]
    fn flag(&mut self, id: ThreadId) -> &mut bool {
        let index = id.as_usize();
        if index >= self.present.len() {
            self.present.resize(index + 1, false);
        }
        &mut self.present[index]
    }
}

impl ReadyQueue for FifoQueue {
    fn push(&mut self, id: ThreadId) -> bool {
        let flag = self.flag(id);
        if *flag {
            return false;
        }
        *flag = true;
        self.queue.push_back(id);
        true
    }

    fn pop(&mut self) -> Option<ThreadId> {
        let id = self.queue.pop_front()?;
        *self.flag(id) = false;
        Some(id)
    }

    fn remove(&mut self, id: ThreadId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if let Some(pos) = self.queue.iter().position(|&queued| queued == id) {
            self.queue.remove(pos);
        }
        *self.flag(id) = false;
        true
    }

    #[inline]
    fn contains(&self, id: ThreadId) -> bool {
        self.present.get(id.as_usize()).copied().unwrap_or(false)
    }

    fn snapshot(&self) -> Vec<ThreadId> {
        self.queue.iter().copied().collect()
    }

    #[inline]
    fn len(&self) -> usize {
        self.queue.len()
    }
}
