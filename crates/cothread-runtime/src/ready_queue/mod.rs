//! Ready queue abstraction
//!
//! Holds every runnable thread except the one currently running.
//!
//! # Implementations
//! - `FifoQueue` - strict FIFO with an O(1) membership check

mod fifo;

pub use fifo::FifoQueue;

use cothread_core::id::ThreadId;

/// Trait for ready queue implementations
///
/// An id is a member at most once: `push` of a member is refused.
pub trait ReadyQueue {
    /// Append a thread to the tail
    ///
    /// Returns `false` (and leaves the queue unchanged) if `id` is
    /// already queued.
    fn push(&mut self, id: ThreadId) -> bool;

    /// Remove and return the head
    fn pop(&mut self) -> Option<ThreadId>;

    /// Remove a thread wherever it sits; `false` if it was not queued
    fn remove(&mut self, id: ThreadId) -> bool;

    /// Check membership
    fn contains(&self, id: ThreadId) -> bool;

    /// Queued ids, head first (for diagnostics)
    fn snapshot(&self) -> Vec<ThreadId>;

    /// Number of queued threads
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
