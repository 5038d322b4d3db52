//! Logical thread lifecycle and exit status types

use core::fmt;
use crate::constants::CANCELLED_STATUS;

/// Lifecycle state of a thread table slot
///
/// ```text
/// Unused -> Ready -> Running -> { Ready, Blocked, Exited, Cancelled }
///                                 Exited | Cancelled -> (join) -> Unused
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Slot is free for reuse
    Unused,

    /// Runnable, waiting in the ready queue
    Ready,

    /// The thread currently executing
    Running,

    /// Waiting in `join` for another thread to terminate
    Blocked,

    /// Terminated through `exit`, awaiting a joiner
    Exited,

    /// Torn down by `cancel`, awaiting a joiner
    Cancelled,
}

impl ThreadState {
    /// Check if this thread has terminated (exited or cancelled)
    #[inline]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, ThreadState::Exited | ThreadState::Cancelled)
    }
}

/// How a thread terminated, as reported by `join`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// The thread called `exit` (or returned from its entry, which exits with 0)
    Exited(u8),

    /// The thread was torn down by `cancel`
    Cancelled,
}

impl ExitStatus {
    /// Build from a requested exit code, keeping its low 8 bits
    #[inline]
    pub const fn from_code(code: i32) -> Self {
        ExitStatus::Exited((code & 0xff) as u8)
    }

    /// Exit code, or `None` for a cancelled thread
    #[inline]
    pub const fn code(&self) -> Option<u8> {
        match self {
            ExitStatus::Exited(code) => Some(*code),
            ExitStatus::Cancelled => None,
        }
    }

    #[inline]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, ExitStatus::Cancelled)
    }

    /// Integer view: 0..=255 for an exit code, `CANCELLED_STATUS` otherwise
    #[inline]
    pub const fn raw(&self) -> i32 {
        match self {
            ExitStatus::Exited(code) => *code as i32,
            ExitStatus::Cancelled => CANCELLED_STATUS,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exited({})", code),
            ExitStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ThreadState::Exited.is_terminated());
        assert!(ThreadState::Cancelled.is_terminated());
        assert!(!ThreadState::Running.is_terminated());
        assert!(!ThreadState::Unused.is_terminated());
    }

    #[test]
    fn test_exit_code_normalized_to_8_bits() {
        assert_eq!(ExitStatus::from_code(7), ExitStatus::Exited(7));
        assert_eq!(ExitStatus::from_code(256), ExitStatus::Exited(0));
        assert_eq!(ExitStatus::from_code(0x1ff), ExitStatus::Exited(255));
        assert_eq!(ExitStatus::from_code(-1), ExitStatus::Exited(255));
    }

    #[test]
    fn test_cancelled_is_disjoint_from_exit_codes() {
        let cancelled = ExitStatus::Cancelled.raw();
        for code in 0..=255 {
            assert_ne!(ExitStatus::Exited(code).raw(), cancelled);
        }
        assert_eq!(ExitStatus::Exited(128).raw(), 128);
        assert_eq!(ExitStatus::Cancelled.code(), None);
        assert!(ExitStatus::Cancelled.is_cancelled());
    }
}
