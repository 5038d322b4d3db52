//! Logical thread identifier type

use core::fmt;

/// Identifier of a logical thread
///
/// This is a 32-bit value that indexes into the thread table. Ids are
/// only meaningful while their slot is in use: once a thread has been
/// reaped by `join`, the id may be handed out again by `create`.
/// The maximum value (u32::MAX) is reserved as a sentinel for "no thread".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadId(u32);

impl ThreadId {
    /// Sentinel value indicating no thread
    pub const NONE: ThreadId = ThreadId(u32::MAX);

    /// The thread that called `init`
    pub const MAIN: ThreadId = ThreadId(crate::constants::MAIN_THREAD);

    /// Create a new ThreadId from a raw value
    #[inline]
    pub const fn new(id: u32) -> Self {
        ThreadId(id)
    }

    /// Create from a table index
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        ThreadId(index as u32)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get as usize for indexing
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Check if this is the main thread
    #[inline]
    pub const fn is_main(self) -> bool {
        self.0 == crate::constants::MAIN_THREAD
    }
}

impl From<u32> for ThreadId {
    #[inline]
    fn from(id: u32) -> Self {
        ThreadId(id)
    }
}

impl From<ThreadId> for u32 {
    #[inline]
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Debug for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "ThreadId(NONE)")
        } else {
            write!(f, "ThreadId({})", self.0)
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        ThreadId::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_basics() {
        let id = ThreadId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.as_usize(), 42);
        assert!(!id.is_none());
        assert!(!id.is_main());
        assert_eq!(ThreadId::from_index(42), id);
    }

    #[test]
    fn test_thread_id_none() {
        let none = ThreadId::NONE;
        assert!(none.is_none());
        assert_eq!(ThreadId::default(), ThreadId::NONE);
        assert_eq!(format!("{}", none), "none");
    }

    #[test]
    fn test_main_is_zero() {
        assert!(ThreadId::MAIN.is_main());
        assert_eq!(ThreadId::MAIN.as_u32(), 0);
        let raw: u32 = ThreadId::MAIN.into();
        assert_eq!(raw, 0);
    }
}
