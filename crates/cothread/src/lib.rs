//! # cothread - Cooperative User-Level Threads
//!
//! Many logical threads multiplexed on the single OS thread that calls
//! [`init`]. Nothing is preemptive: a thread runs until it calls
//! [`yield_now`], blocks in [`join`], or terminates.
//!
//! ## Features
//!
//! - **FIFO scheduling**: runnable threads are resumed strictly in the
//!   order they became runnable
//! - **Join and cancel**: one joiner per thread, reaping its exit status
//! - **Own stacks**: each thread gets an mmap'd stack with a guard page
//! - **Per OS thread**: several OS threads may each run their own scheduler
//!
//! ## Quick Start
//!
//! ```ignore
//! use cothread::{create, exit, init, join, yield_now};
//!
//! fn main() {
//!     init().unwrap();
//!
//!     let t = create(|| {
//!         println!("first slice");
//!         let _ = yield_now();
//!         println!("second slice");
//!         exit(7);
//!     })
//!     .unwrap();
//!
//!     let status = join(t).unwrap();
//!     assert_eq!(status.code(), Some(7));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │          create(), yield_now(), join(), cancel()            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Scheduler (thread-local, per OS thread)        │
//! │            Thread table, FIFO ready queue, join links       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Context switch + stacks                      │
//! │        naked asm save/restore, mmap + guard page            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Process exit
//!
//! When the last runnable thread exits, the process exits. Its code is 0
//! by default; set `COTHREAD_LAST_EXIT=status` (or
//! [`SchedulerConfig::last_exit`]) to use the thread's own status.

// Re-export core types
pub use cothread_core::{
    ThreadId,
    ThreadState,
    ExitStatus,
    SchedError,
    SchedResult,
    MemoryError,
    ConfigError,
};
pub use cothread_core::constants::{CANCELLED_STATUS, ERROR_STATUS, PANIC_STATUS};

// Re-export kprint macros for debug logging
pub use cothread_core::{kprint, kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use cothread_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled};

// Re-export env utilities
pub use cothread_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use cothread_runtime::{SchedulerConfig, LastExitPolicy};

use cothread_runtime::scheduler;

/// Initialize the scheduler on this OS thread with defaults and env overrides
///
/// The caller becomes thread 0 and keeps running. Fails with
/// `AlreadyInitialized` if this OS thread already has a scheduler.
pub fn init() -> SchedResult<()> {
    init_with_config(SchedulerConfig::from_env())
}

/// Initialize the scheduler with an explicit configuration
pub fn init_with_config(config: SchedulerConfig) -> SchedResult<()> {
    scheduler::init(config)
}

/// Tear down this OS thread's scheduler
///
/// Must be called from thread 0. Threads that have not terminated are
/// discarded; their stacks are unmapped without unwinding them.
pub fn shutdown() -> SchedResult<()> {
    scheduler::shutdown()
}

/// Id of the calling thread, or `ThreadId::NONE` before `init`
#[inline]
pub fn id() -> ThreadId {
    scheduler::current_id()
}

/// Create a thread that will run `f` once scheduled
///
/// The new thread joins the back of the ready queue; the caller keeps
/// running. Returning from `f` is the same as `exit(0)`; a panic in `f`
/// is contained and recorded as exit status [`PANIC_STATUS`].
pub fn create<F>(f: F) -> SchedResult<ThreadId>
where
    F: FnOnce() + 'static,
{
    scheduler::create(Box::new(f))
}

/// Give up the processor to the next ready thread
///
/// Returns `Err(NothingToRun)` immediately when no other thread is ready.
#[inline]
pub fn yield_now() -> SchedResult<()> {
    scheduler::yield_now()
}

/// Wait for `target` to terminate and reap it
///
/// Errors:
/// - `InvalidThread` - `target` is not in use
/// - `JoinSelf` - `target` is the caller
/// - `AlreadyJoined` - another thread is already joining `target`
/// - `WouldDeadlock` - no other thread could ever run to wake the caller
pub fn join(target: ThreadId) -> SchedResult<ExitStatus> {
    scheduler::join(target)
}

/// Terminate `target` without letting it run again
///
/// A thread joining `target` becomes ready and sees
/// [`ExitStatus::Cancelled`].
pub fn cancel(target: ThreadId) -> SchedResult<()> {
    scheduler::cancel(target)
}

/// Terminate the calling thread with status `code & 0xff`
///
/// If this leaves no runnable thread, the whole process exits.
pub fn exit(code: i32) -> ! {
    scheduler::exit(code)
}

/// Lifecycle state of `id`
pub fn state(id: ThreadId) -> Option<ThreadState> {
    scheduler::state(id)
}

/// Number of threads waiting in the ready queue
pub fn ready_len() -> usize {
    scheduler::ready_len()
}

/// Current thread table capacity
pub fn capacity() -> usize {
    scheduler::capacity()
}

/// Check whether this OS thread has a scheduler
pub fn is_initialized() -> bool {
    cothread_runtime::tls::is_initialized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> SchedulerConfig {
        SchedulerConfig::new().stack_size(64 * 1024)
    }

    #[test]
    fn test_ping_pong() {
        init_with_config(config()).unwrap();
        let trace = Rc::new(RefCell::new(Vec::new()));

        let t = trace.clone();
        let ping = create(move || {
            for i in 0..3 {
                t.borrow_mut().push(format!("ping{}", i));
                yield_now().unwrap();
            }
        })
        .unwrap();
        let t = trace.clone();
        let pong = create(move || {
            for i in 0..3 {
                t.borrow_mut().push(format!("pong{}", i));
                let _ = yield_now();
            }
        })
        .unwrap();

        assert_eq!(join(ping), Ok(ExitStatus::Exited(0)));
        assert_eq!(join(pong), Ok(ExitStatus::Exited(0)));
        assert_eq!(
            *trace.borrow(),
            vec!["ping0", "pong0", "ping1", "pong1", "ping2", "pong2"]
        );
        shutdown().unwrap();
    }

    #[test]
    fn test_nested_create_and_join() {
        init_with_config(config()).unwrap();
        let outer = create(|| {
            let inner = create(|| exit(id().as_u32() as i32 + 40)).unwrap();
            let status = join(inner).unwrap();
            exit(status.raw() + 1)
        })
        .unwrap();

        // inner is id 2: exits 42, outer exits 43
        assert_eq!(join(outer), Ok(ExitStatus::Exited(43)));
        shutdown().unwrap();
    }

    #[test]
    fn test_cancelled_status_is_distinct() {
        init_with_config(config()).unwrap();
        let t = create(|| {}).unwrap();
        cancel(t).unwrap();
        let status = join(t).unwrap();
        assert!(status.is_cancelled());
        assert_eq!(status.code(), None);
        assert_eq!(status.raw(), CANCELLED_STATUS);
        assert_ne!(status.raw(), ERROR_STATUS);
        shutdown().unwrap();
    }

    #[test]
    fn test_error_codes() {
        assert!(!is_initialized());
        let err = join(ThreadId::new(1)).unwrap_err();
        assert_eq!(err, SchedError::NotInitialized);
        assert_eq!(err.code(), ERROR_STATUS);
        assert_eq!(id(), ThreadId::NONE);
    }
}
