//! Opaque saved execution state of a logical thread

use crate::current_arch::{self, SavedRegs};
use crate::memory::Stack;

/// Entry point a primed context starts in, called with its argument
pub type EntryFn = extern "C" fn(usize) -> !;

/// Saved execution state (register set + stack pointer)
///
/// Boxed so the save area keeps its address when the thread table grows:
/// a suspended thread's registers are written through a raw pointer taken
/// just before the switch.
pub struct Context {
    regs: Box<SavedRegs>,
}

impl Context {
    /// A save area for a thread that is already running (the main thread).
    ///
    /// Filled in by the first switch away from it.
    pub fn empty() -> Self {
        Self {
            regs: Box::default(),
        }
    }

    /// A context that starts `entry(arg)` on `stack` when first switched to
    pub fn primed(stack: &Stack, entry: EntryFn, arg: usize) -> Self {
        let mut ctx = Self::empty();
        unsafe {
            current_arch::init_context(ctx.as_mut_ptr(), stack.top(), entry as usize, arg);
        }
        ctx
    }

    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut SavedRegs {
        &mut *self.regs as *mut SavedRegs
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const SavedRegs {
        &*self.regs as *const SavedRegs
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("at", &self.as_ptr()).finish()
    }
}

/// A pending transfer of control between two save areas
///
/// Built while the scheduler is borrowed, performed after the borrow is
/// released: nothing may hold scheduler state across a switch.
#[must_use]
pub(crate) struct Switch {
    pub(crate) from: *mut SavedRegs,
    pub(crate) to: *const SavedRegs,
}

impl Switch {
    /// Suspend the running thread into `from` and resume `to`.
    ///
    /// Returns when some thread later switches back to `from`.
    ///
    /// # Safety
    ///
    /// Both save areas must still be allocated, and the stack `to` runs on
    /// must still be mapped.
    #[inline]
    pub(crate) unsafe fn perform(self) {
        current_arch::context_switch(self.from, self.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn never(_arg: usize) -> ! {
        std::process::abort()
    }

    #[test]
    fn test_primed_context_starts_on_stack() {
        let stack = Stack::new(64 * 1024).unwrap();
        let ctx = Context::primed(&stack, never, 7);
        let regs = unsafe { &*ctx.as_ptr() };

        #[cfg(target_arch = "x86_64")]
        let sp = {
            assert_eq!(regs.r12 as usize, never as usize);
            assert_eq!(regs.r13, 7);
            assert_eq!(regs.mxcsr, current_arch::DEFAULT_MXCSR);
            assert_eq!(regs.fpucw, current_arch::DEFAULT_FPUCW);
            regs.rsp as usize
        };
        #[cfg(target_arch = "aarch64")]
        let sp = {
            assert_eq!(regs.x[0] as usize, never as usize);
            assert_eq!(regs.x[1], 7);
            assert_eq!(regs.fpcr, 0);
            regs.sp as usize
        };
        assert_eq!(sp % 16, 0);
        assert!(sp <= stack.top() as usize);
        assert!(sp > stack.bottom() as usize);
    }

    #[test]
    fn test_context_address_survives_move() {
        let ctx = Context::empty();
        let before = ctx.as_ptr();
        let moved = vec![ctx];
        assert_eq!(moved[0].as_ptr(), before);
    }
}
