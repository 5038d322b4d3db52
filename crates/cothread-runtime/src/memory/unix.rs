//! Unix stack implementation using mmap

use super::{Stack, DEFAULT_PAGE_SIZE};
use cothread_core::error::MemoryError;
use cothread_core::kwarn;
use nix::unistd::{sysconf, SysconfVar};
use std::ptr::NonNull;
use std::sync::OnceLock;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// System page size (queried once)
pub fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(|| match sysconf(SysconfVar::PAGE_SIZE) {
        Ok(Some(n)) if n > 0 => n as usize,
        _ => DEFAULT_PAGE_SIZE,
    })
}

impl Stack {
    /// Map a new stack with at least `size` usable bytes
    ///
    /// The usable size is rounded up to whole pages and one extra guard
    /// page is mapped below it with `PROT_NONE`.
    pub fn new(size: usize) -> Result<Stack, MemoryError> {
        let guard = page_size();
        let usable = super::round_to_page(size.max(1));
        let mapped = usable.checked_add(guard).ok_or(MemoryError::AllocationFailed)?;

        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mapped,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(MemoryError::AllocationFailed);
        }

        // Lowest page becomes the guard: an overflow faults here
        let ret = unsafe { libc::mprotect(base, guard, libc::PROT_NONE) };
        if ret != 0 {
            unsafe {
                libc::munmap(base, mapped);
            }
            return Err(MemoryError::ProtectionFailed);
        }

        let base = NonNull::new(base as *mut u8).ok_or(MemoryError::AllocationFailed)?;
        Ok(Stack { base, mapped, guard })
    }

    fn release(&mut self) -> Result<(), MemoryError> {
        let ret = unsafe { libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.mapped) };
        if ret != 0 {
            return Err(MemoryError::ReleaseFailed);
        }
        Ok(())
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            kwarn!("{} at {:p}", e, self.base);
        }
    }
}
