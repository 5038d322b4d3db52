//! Cooperative scheduler
//!
//! Multiplexes logical threads over the OS thread that called `init`.
//! Control only changes hands at three points: `yield_now`, `join` on a
//! live thread, and `exit`. Runnable threads wait in a strict FIFO ready
//! queue; the running thread is never in it.
//!
//! Every operation follows the same shape: borrow the thread-local
//! scheduler, update the table and queue, release the borrow, and only
//! then perform the context switch the update decided on.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use cothread_core::constants::PANIC_STATUS;
use cothread_core::error::{SchedError, SchedResult};
use cothread_core::id::ThreadId;
use cothread_core::kprint::{self, LogLevel};
use cothread_core::state::{ExitStatus, ThreadState};
use cothread_core::{kdebug, kerror, ktrace};

use crate::config::SchedulerConfig;
use crate::context::Switch;
use crate::fatal;
use crate::ready_queue::{FifoQueue, ReadyQueue};
use crate::table::{Entry, Released, ThreadTable};
use crate::tls;

/// Scheduler state for one OS thread
pub struct Scheduler {
    /// Configuration
    config: SchedulerConfig,

    /// Thread control blocks
    table: ThreadTable,

    /// Runnable threads, FIFO
    ready: Box<dyn ReadyQueue>,

    /// The thread flagged running
    current: ThreadId,
}

/// Outcome of a `join` request
enum JoinStep {
    /// Target had already terminated and was reaped in place
    Reaped(ExitStatus, Released),
    /// Caller must suspend until the target terminates
    Wait(Switch),
}

/// Outcome of an `exit` request
enum ExitStep {
    Switch(Switch),
    /// No runnable thread remains: terminate the process with this code
    Last(i32),
}

impl Scheduler {
    /// Create a scheduler whose main thread (id 0) is the caller
    pub fn new(config: SchedulerConfig) -> SchedResult<Self> {
        config.validate()?;

        let mut table = ThreadTable::new(&config);
        let main = table.register_main();
        let ready = Box::new(FifoQueue::with_capacity(config.initial_capacity));

        Ok(Self {
            config,
            table,
            ready,
            current: main,
        })
    }

    /// The running thread
    ///
    /// No running thread means the scheduler's own bookkeeping is broken.
    pub fn current(&self) -> ThreadId {
        match self.table.live(self.current) {
            Some(tcb) if tcb.is_running() => self.current,
            _ => fatal!("no thread is marked running"),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn table(&self) -> &ThreadTable {
        &self.table
    }

    /// Ready queue contents, head first
    pub fn ready_ids(&self) -> Vec<ThreadId> {
        self.ready.snapshot()
    }

    /// Lifecycle state of a slot, `None` if it was never used
    pub fn state(&self, id: ThreadId) -> Option<ThreadState> {
        let tcb = self.table.get(id)?;
        let state = if tcb.is_available() {
            ThreadState::Unused
        } else {
            match tcb.status() {
                Some(ExitStatus::Cancelled) => ThreadState::Cancelled,
                Some(ExitStatus::Exited(_)) => ThreadState::Exited,
                None if tcb.is_running() => ThreadState::Running,
                None if self.ready.contains(id) => ThreadState::Ready,
                None => ThreadState::Blocked,
            }
        };
        Some(state)
    }

    /// Allocate a thread for `entry` and queue it
    pub fn create(&mut self, entry: Entry) -> ThreadId {
        let id = match self.table.create_slot(entry, thread_start) {
            Ok(id) => id,
            Err(e) => fatal!("create: {}", e),
        };
        self.enqueue(id);
        kdebug!("created thread {}", id);
        id
    }

    fn enqueue(&mut self, id: ThreadId) {
        if !self.ready.push(id) {
            ktrace!("thread {} already queued", id);
        }
    }

    fn dequeue_head(&mut self) -> ThreadId {
        match self.ready.pop() {
            Some(id) => id,
            None => fatal!("dequeue from an empty ready queue"),
        }
    }

    /// Hand the running flag to `next` and describe the switch
    ///
    /// The caller performs the returned switch after releasing the
    /// scheduler borrow.
    fn switch_to(&mut self, next: ThreadId) -> Switch {
        let prev = self.current;
        if let Some(tcb) = self.table.get_mut(prev) {
            tcb.running = false;
        }
        match self.table.get_mut(next) {
            Some(tcb) if !tcb.available && tcb.status.is_none() => tcb.running = true,
            _ => fatal!("switch to non-runnable thread {}", next),
        }
        self.current = next;
        kprint::set_thread_id(next.as_u32());
        ktrace!("switch {} -> {}", prev, next);

        let to = match self.table.get(next).and_then(|tcb| tcb.context.as_ref()) {
            Some(ctx) => ctx.as_ptr(),
            None => fatal!("thread {} has no context", next),
        };
        let from = match self.table.get_mut(prev).and_then(|tcb| tcb.context.as_mut()) {
            Some(ctx) => ctx.as_mut_ptr(),
            None => fatal!("thread {} has no context", prev),
        };
        Switch { from, to }
    }

    fn prepare_yield(&mut self) -> SchedResult<Switch> {
        if self.ready.is_empty() {
            return Err(SchedError::NothingToRun);
        }
        let cur = self.current();
        self.enqueue(cur);
        let next = self.dequeue_head();
        Ok(self.switch_to(next))
    }

    fn prepare_join(&mut self, target: ThreadId) -> SchedResult<JoinStep> {
        let cur = self.current();
        let tcb = self.table.live(target).ok_or(SchedError::InvalidThread(target))?;
        if target == cur {
            return Err(SchedError::JoinSelf);
        }
        if tcb.blocker().is_some() {
            return Err(SchedError::AlreadyJoined(target));
        }
        if let Some(status) = tcb.status() {
            kdebug!("join {}: already {}", target, status);
            let released = self.reap(target);
            return Ok(JoinStep::Reaped(status, released));
        }

        self.ready.remove(cur);
        if self.ready.is_empty() {
            return Err(SchedError::WouldDeadlock);
        }

        if let Some(tcb) = self.table.get_mut(target) {
            tcb.blocker = Some(cur);
        }
        if let Some(tcb) = self.table.get_mut(cur) {
            tcb.blocked_on = Some(target);
        }
        kdebug!("join {}: blocking", target);
        let next = self.dequeue_head();
        Ok(JoinStep::Wait(self.switch_to(next)))
    }

    /// Complete a join after the caller was woken by the target's termination
    fn finish_join(&mut self, target: ThreadId) -> (ExitStatus, Released) {
        let status = match self.table.get(target).and_then(|tcb| tcb.status()) {
            Some(status) => status,
            None => fatal!("joiner resumed before thread {} terminated", target),
        };
        kdebug!("join {}: woke, {}", target, status);
        (status, self.reap(target))
    }

    /// Break the join link (if any) and free the terminated thread's slot
    fn reap(&mut self, target: ThreadId) -> Released {
        let joiner = self.table.get(target).and_then(|tcb| tcb.blocker());
        if let Some(tcb) = joiner.and_then(|id| self.table.get_mut(id)) {
            if tcb.blocked_on == Some(target) {
                tcb.blocked_on = None;
            }
        }
        self.table.reclaim(target)
    }

    /// Tear down `target` without running it again
    ///
    /// Its stack, context and unrun entry come back to the caller, to be
    /// dropped outside the scheduler borrow.
    pub fn cancel(&mut self, target: ThreadId) -> SchedResult<Released> {
        let cur = self.current();
        if target == cur {
            return Err(SchedError::CancelSelf);
        }
        let tcb = self.table.live(target).ok_or(SchedError::InvalidThread(target))?;
        if tcb.is_terminated() {
            return Err(SchedError::AlreadyTerminated(target));
        }
        let (joiner, waited) = (tcb.blocker(), tcb.blocked_on());

        self.ready.remove(target);

        // Its joiner observes the cancellation when it next runs
        if let Some(joiner) = joiner {
            self.enqueue(joiner);
        }

        // It can no longer be woken by the thread it was joining
        if let Some(tcb) = waited.and_then(|id| self.table.get_mut(id)) {
            if tcb.blocker == Some(target) {
                tcb.blocker = None;
            }
        }

        let released = self.table.release_resources(target);
        if let Some(tcb) = self.table.get_mut(target) {
            tcb.status = Some(ExitStatus::Cancelled);
            tcb.blocked_on = None;
            tcb.running = false;
        }
        kdebug!("cancelled thread {}", target);
        Ok(released)
    }

    fn prepare_exit(&mut self, code: i32) -> ExitStep {
        let cur = self.current();
        let status = ExitStatus::from_code(code);
        self.ready.remove(cur);

        let joiner = match self.table.get_mut(cur) {
            Some(tcb) => {
                tcb.status = Some(status);
                tcb.blocker
            }
            None => None,
        };
        if let Some(joiner) = joiner {
            self.enqueue(joiner);
        }
        kdebug!("exit {}", status);

        if self.ready.is_empty() {
            let code = self.config.last_exit.process_code(status.code().unwrap_or(0));
            return ExitStep::Last(code);
        }
        let next = self.dequeue_head();
        ExitStep::Switch(self.switch_to(next))
    }

    fn take_entry(&mut self, id: ThreadId) -> Option<Entry> {
        self.table.get_mut(id).and_then(|tcb| tcb.entry.take())
    }

    /// Only thread 0 runs on the host OS stack
    fn check_host(&self) -> SchedResult<()> {
        if self.current().is_main() {
            Ok(())
        } else {
            Err(SchedError::NotMainThread)
        }
    }
}

/// Entry point of every new thread's context
///
/// Runs the thread's closure, then exits on its behalf with 0, or with
/// `PANIC_STATUS` if the closure panicked.
extern "C" fn thread_start(arg: usize) -> ! {
    let id = ThreadId::from_index(arg);
    let entry = match tls::with_scheduler(|s| s.take_entry(id)) {
        Ok(Some(entry)) => entry,
        _ => fatal!("thread {} started without an entry", id),
    };
    ktrace!("thread {} started", id);

    let code = match panic::catch_unwind(AssertUnwindSafe(entry)) {
        Ok(()) => 0,
        Err(payload) => {
            kerror!("thread {} panicked: {}", id, panic_message(&*payload));
            PANIC_STATUS as i32
        }
    };
    exit(code)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string payload"
    }
}

// ============================================================================
// Operations on this OS thread's scheduler
// ============================================================================

/// Install a scheduler on this OS thread; the caller becomes thread 0
pub fn init(config: SchedulerConfig) -> SchedResult<()> {
    if config.debug_logging && kprint::log_level() < LogLevel::Debug {
        kprint::set_log_level(LogLevel::Debug);
    }
    tls::install(Scheduler::new(config)?)?;
    kprint::set_thread_id(ThreadId::MAIN.as_u32());
    kdebug!("scheduler initialized");
    Ok(())
}

/// Uninstall this OS thread's scheduler, releasing every stack
///
/// Only the main thread (still on the host stack) may do this. Threads
/// that have not terminated are discarded without running again; values
/// living on their stacks are never dropped.
pub fn shutdown() -> SchedResult<()> {
    tls::with_scheduler(|s| s.check_host())??;
    let scheduler = tls::uninstall();
    kdebug!("scheduler shut down");
    kprint::clear_thread_id();
    drop(scheduler);
    Ok(())
}

/// Id of the running thread, `ThreadId::NONE` without a scheduler
pub fn current_id() -> ThreadId {
    tls::with_scheduler(|s| s.current()).unwrap_or(ThreadId::NONE)
}

/// Create a thread running `entry`; it runs once scheduled
pub fn create(entry: Entry) -> SchedResult<ThreadId> {
    tls::with_scheduler(|s| s.create(entry))
}

/// Move the caller to the back of the ready queue and run the head
///
/// `Err(NothingToRun)` (without switching) if no other thread is ready.
pub fn yield_now() -> SchedResult<()> {
    let switch = tls::with_scheduler(|s| s.prepare_yield())??;
    unsafe { switch.perform() };
    Ok(())
}

/// Wait for `target` to terminate, reap it and return how it ended
///
/// Returns at once if `target` already terminated. Only one thread may
/// join a given thread.
pub fn join(target: ThreadId) -> SchedResult<ExitStatus> {
    match tls::with_scheduler(|s| s.prepare_join(target))?? {
        JoinStep::Reaped(status, released) => {
            drop(released);
            Ok(status)
        }
        JoinStep::Wait(switch) => {
            unsafe { switch.perform() };
            let (status, released) = tls::with_scheduler(|s| s.finish_join(target))?;
            drop(released);
            Ok(status)
        }
    }
}

/// Tear down `target`; a thread joining it is woken
///
/// An entry closure that never ran is dropped here, after the scheduler
/// is free again, so its captures may still call into cothread.
pub fn cancel(target: ThreadId) -> SchedResult<()> {
    let released = tls::with_scheduler(|s| s.cancel(target))??;
    drop(released);
    Ok(())
}

/// Terminate the calling thread with the low 8 bits of `code`
///
/// Wakes the thread joining the caller, if any. When no runnable thread
/// remains the process exits, with the code chosen by the configured
/// `LastExitPolicy`. Without a scheduler the process exits with `code`.
pub fn exit(code: i32) -> ! {
    match tls::with_scheduler(|s| s.prepare_exit(code)) {
        Ok(ExitStep::Switch(switch)) => {
            unsafe { switch.perform() };
            fatal!("terminated thread resumed")
        }
        Ok(ExitStep::Last(process_code)) => {
            kdebug!("last runnable thread exited, process exit {}", process_code);
            // The caller may be running on one of the scheduler's stacks;
            // TLS destructors run by `process::exit` must not unmap it.
            std::mem::forget(tls::uninstall());
            std::process::exit(process_code)
        }
        Err(_) => std::process::exit(code & 0xff),
    }
}

/// Lifecycle state of `id`, `None` for a never-used id or without a scheduler
pub fn state(id: ThreadId) -> Option<ThreadState> {
    tls::with_scheduler(|s| s.state(id)).ok().flatten()
}

/// Number of threads waiting in the ready queue
pub fn ready_len() -> usize {
    tls::with_scheduler(|s| s.ready_ids().len()).unwrap_or(0)
}

/// Current thread table capacity
pub fn capacity() -> usize {
    tls::with_scheduler(|s| s.table().capacity()).unwrap_or(0)
}
