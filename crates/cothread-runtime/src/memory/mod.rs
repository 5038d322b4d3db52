//! Stack memory for logical threads
//!
//! Each thread created by the scheduler owns one `Stack`: an anonymous
//! mapping whose lowest page is a `PROT_NONE` guard, so an overflow faults
//! instead of silently corrupting a neighbouring mapping.
//!
//! ```text
//! base                base + guard                     top
//!  | guard (PROT_NONE) |      usable stack (RW)  <-grows |
//! ```

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use unix::*;
    }
}

use std::ptr::NonNull;

/// Fallback when the page size cannot be queried
const DEFAULT_PAGE_SIZE: usize = 4096;

/// Smallest stack accepted by the configuration
pub const MIN_STACK_SIZE: usize = libc::SIGSTKSZ as usize;

/// An exclusively-owned, guard-protected thread stack
///
/// Unmapped when dropped.
pub struct Stack {
    /// Start of the mapping (the guard page)
    base: NonNull<u8>,

    /// Total mapped length, guard included
    mapped: usize,

    /// Guard length at the bottom of the mapping
    guard: usize,
}

impl Stack {
    /// Highest address of the stack (stack grows down)
    #[inline]
    pub fn top(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.mapped) }
    }

    /// Lowest usable address (just above the guard page)
    #[inline]
    pub fn bottom(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.guard) }
    }

    /// Usable bytes between `bottom` and `top`
    #[inline]
    pub fn usable_size(&self) -> usize {
        self.mapped - self.guard
    }

    /// Check whether `addr` lies in the usable part of this stack
    #[inline]
    pub fn contains(&self, addr: *const u8) -> bool {
        let addr = addr as usize;
        addr >= self.bottom() as usize && addr < self.top() as usize
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("bottom", &self.bottom())
            .field("top", &self.top())
            .field("usable_size", &self.usable_size())
            .finish()
    }
}

/// Round `size` up to a multiple of the page size
#[inline]
pub fn round_to_page(size: usize) -> usize {
    let page = page_size();
    size.div_ceil(page) * page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_sane() {
        let page = page_size();
        assert!(page >= 4096);
        assert!(page.is_power_of_two());
    }

    #[test]
    fn test_round_to_page() {
        let page = page_size();
        assert_eq!(round_to_page(1), page);
        assert_eq!(round_to_page(page), page);
        assert_eq!(round_to_page(page + 1), 2 * page);
    }

    #[test]
    fn test_stack_layout() {
        let stack = Stack::new(64 * 1024).unwrap();
        assert!(stack.usable_size() >= 64 * 1024);
        assert_eq!(stack.top() as usize % page_size(), 0);
        assert_eq!(stack.top() as usize - stack.bottom() as usize, stack.usable_size());
        assert!(stack.contains(stack.bottom()));
        assert!(!stack.contains(stack.top()));
    }

    #[test]
    fn test_stack_is_writable() {
        let stack = Stack::new(MIN_STACK_SIZE).unwrap();
        unsafe {
            // Touch both ends of the usable range
            stack.bottom().write(0xAB);
            stack.top().sub(1).write(0xCD);
            assert_eq!(stack.bottom().read(), 0xAB);
            assert_eq!(stack.top().sub(1).read(), 0xCD);
        }
    }

    #[test]
    fn test_stacks_are_distinct() {
        let a = Stack::new(MIN_STACK_SIZE).unwrap();
        let b = Stack::new(MIN_STACK_SIZE).unwrap();
        assert!(!a.contains(b.bottom()));
        assert!(!b.contains(a.bottom()));
    }
}
