//! Thread-local scheduler slot
//!
//! One scheduler per OS thread. Every logical thread it manages runs on
//! that OS thread, so all of them see the same slot; other OS threads see
//! their own (usually empty) slot.

use std::cell::RefCell;

use cothread_core::error::{SchedError, SchedResult};

use crate::scheduler::Scheduler;

thread_local! {
    static SCHEDULER: RefCell<Option<Scheduler>> = const { RefCell::new(None) };
}

/// Install a scheduler on this OS thread
pub(crate) fn install(scheduler: Scheduler) -> SchedResult<()> {
    SCHEDULER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return Err(SchedError::AlreadyInitialized);
        }
        *slot = Some(scheduler);
        Ok(())
    })
}

/// Remove this OS thread's scheduler, handing it to the caller to drop
pub(crate) fn uninstall() -> Option<Scheduler> {
    SCHEDULER.with(|cell| cell.borrow_mut().take())
}

/// Check whether this OS thread has a scheduler
#[inline]
pub fn is_initialized() -> bool {
    SCHEDULER.with(|cell| cell.borrow().is_some())
}

/// Run `f` against this OS thread's scheduler
///
/// The borrow ends when `f` returns. A context switch must never happen
/// inside `f`: callers build a `Switch` here and perform it afterwards.
pub(crate) fn with_scheduler<R>(f: impl FnOnce(&mut Scheduler) -> R) -> SchedResult<R> {
    SCHEDULER.with(|cell| {
        let Ok(mut slot) = cell.try_borrow_mut() else {
            crate::fatal!("scheduler re-entered");
        };
        match slot.as_mut() {
            Some(scheduler) => Ok(f(scheduler)),
            None => Err(SchedError::NotInitialized),
        }
    })
}
