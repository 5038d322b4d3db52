//! Thread table: owns every Thread Control Block
//!
//! Slots are indexed by `ThreadId`. A new thread always takes the
//! lowest-indexed available slot, so ids stay small and dense; a slot only
//! becomes available again once its thread has been reaped by `join`.
//!
//! Capacity grows geometrically (`growth_factor`) once more than
//! `load_factor_percent` of it has been used. Stacks are separate mappings
//! and contexts are boxed, so growth never moves either.

use cothread_core::id::ThreadId;
use cothread_core::state::ExitStatus;
use cothread_core::error::MemoryError;
use cothread_core::ktrace;

use crate::config::SchedulerConfig;
use crate::context::{Context, EntryFn};
use crate::memory::{Stack, MIN_STACK_SIZE};

/// User function a thread runs when first scheduled
pub type Entry = Box<dyn FnOnce() + 'static>;

/// Thread Control Block
pub struct Tcb {
    pub(crate) id: ThreadId,
    /// `None` for the main thread (host stack) and once released
    pub(crate) stack: Option<Stack>,
    /// `None` once released
    pub(crate) context: Option<Context>,
    /// Taken by the trampoline on first run
    pub(crate) entry: Option<Entry>,
    pub(crate) running: bool,
    pub(crate) available: bool,
    /// `None` while alive
    pub(crate) status: Option<ExitStatus>,
    /// Thread blocked in `join` on this one
    pub(crate) blocker: Option<ThreadId>,
    /// Thread this one is joining
    pub(crate) blocked_on: Option<ThreadId>,
}

impl Tcb {
    fn vacant(id: ThreadId) -> Self {
        Self {
            id,
            stack: None,
            context: None,
            entry: None,
            running: false,
            available: true,
            status: None,
            blocker: None,
            blocked_on: None,
        }
    }

    #[inline]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.status.is_some()
    }

    #[inline]
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    #[inline]
    pub fn blocker(&self) -> Option<ThreadId> {
        self.blocker
    }

    #[inline]
    pub fn blocked_on(&self) -> Option<ThreadId> {
        self.blocked_on
    }

    #[inline]
    pub fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    #[inline]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Move out stack, context and any unrun entry closure
    fn release(&mut self) -> Released {
        Released {
            entry: self.entry.take(),
            context: self.context.take(),
            stack: self.stack.take(),
        }
    }
}

/// Resources detached from a slot, freed when dropped
///
/// Dropping an unrun entry runs arbitrary user `Drop` code, which may call
/// back into the scheduler. Callers drop this only after releasing the
/// scheduler borrow.
#[derive(Default)]
pub struct Released {
    entry: Option<Entry>,
    context: Option<Context>,
    stack: Option<Stack>,
}

impl Released {
    /// Check whether nothing was detached
    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.context.is_none() && self.stack.is_none()
    }
}

impl std::fmt::Debug for Released {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Released")
            .field("entry", &self.entry.is_some())
            .field("context", &self.context)
            .field("stack", &self.stack)
            .finish()
    }
}

impl std::fmt::Debug for Tcb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tcb")
            .field("id", &self.id)
            .field("running", &self.running)
            .field("available", &self.available)
            .field("status", &self.status)
            .field("blocker", &self.blocker)
            .field("blocked_on", &self.blocked_on)
            .field("stack", &self.stack)
            .finish()
    }
}

/// Growable, indexed collection of TCBs
pub struct ThreadTable {
    /// Every slot ever used; `slots.len()` is the used count
    slots: Vec<Tcb>,
    capacity: usize,
    load_factor_percent: usize,
    growth_factor: usize,
    stack_size: usize,
}

impl ThreadTable {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            slots: Vec::with_capacity(config.initial_capacity),
            capacity: config.initial_capacity,
            load_factor_percent: config.load_factor_percent,
            growth_factor: config.growth_factor,
            stack_size: config.stack_size.max(MIN_STACK_SIZE),
        }
    }

    /// Register the calling OS thread as the running main thread
    ///
    /// Needs no stack (it already has one) and starts with an empty save
    /// area, filled by its first switch away.
    pub fn register_main(&mut self) -> ThreadId {
        debug_assert!(self.slots.is_empty());
        let id = ThreadId::MAIN;
        let mut tcb = Tcb::vacant(id);
        tcb.context = Some(Context::empty());
        tcb.running = true;
        tcb.available = false;
        self.slots.push(tcb);
        id
    }

    /// Allocate a slot for a new thread that will run `entry`
    ///
    /// The thread's context is primed to start in `start(id)`.
    pub fn create_slot(&mut self, entry: Entry, start: EntryFn) -> Result<ThreadId, MemoryError> {
        self.grow_if_needed();

        let index = self.lowest_available();
        let id = ThreadId::from_index(index);

        let stack = Stack::new(self.stack_size)?;
        let context = Context::primed(&stack, start, index);

        if index == self.slots.len() {
            self.slots.push(Tcb::vacant(id));
        }
        let tcb = &mut self.slots[index];
        tcb.stack = Some(stack);
        tcb.context = Some(context);
        tcb.entry = Some(entry);
        tcb.running = false;
        tcb.available = false;
        tcb.status = None;
        tcb.blocker = None;
        tcb.blocked_on = None;

        Ok(id)
    }

    /// Free a terminated thread's slot for reuse
    ///
    /// Detaches its stack and context unless a cancellation already did.
    /// The exit status stays readable until the slot is reused.
    pub fn reclaim(&mut self, id: ThreadId) -> Released {
        let Some(tcb) = self.slots.get_mut(id.as_usize()) else {
            return Released::default();
        };
        debug_assert!(!tcb.available, "double reclaim of thread {}", id);
        let released = tcb.release();
        tcb.available = true;
        tcb.running = false;
        tcb.blocker = None;
        tcb.blocked_on = None;
        ktrace!("reclaimed slot {}", id);
        released
    }

    /// Detach a thread's stack, context and entry early, keeping the slot in use
    pub fn release_resources(&mut self, id: ThreadId) -> Released {
        match self.slots.get_mut(id.as_usize()) {
            Some(tcb) => tcb.release(),
            None => Released::default(),
        }
    }

    fn grow_if_needed(&mut self) {
        if self.slots.len() * 100 > self.capacity * self.load_factor_percent {
            let grown = self.capacity.saturating_mul(self.growth_factor);
            ktrace!("thread table grows {} -> {}", self.capacity, grown);
            self.capacity = grown;
            self.slots.reserve_exact(grown.saturating_sub(self.slots.len()));
        }
    }

    fn lowest_available(&self) -> usize {
        self.slots
            .iter()
            .position(|tcb| tcb.available)
            .unwrap_or(self.slots.len())
    }

    /// Slot for `id`, in use or not
    #[inline]
    pub fn get(&self, id: ThreadId) -> Option<&Tcb> {
        self.slots.get(id.as_usize())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: ThreadId) -> Option<&mut Tcb> {
        self.slots.get_mut(id.as_usize())
    }

    /// Slot for `id` only if it is in use
    #[inline]
    pub fn live(&self, id: ThreadId) -> Option<&Tcb> {
        self.get(id).filter(|tcb| !tcb.available)
    }

    /// First thread flagged running, by scan
    pub fn running(&self) -> Option<ThreadId> {
        self.slots.iter().find(|tcb| tcb.running).map(|tcb| tcb.id)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots used at least once
    #[inline]
    pub fn used(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently in use
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|tcb| !tcb.available).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn never(_arg: usize) -> ! {
        std::process::abort()
    }

    fn table(capacity: usize) -> ThreadTable {
        let config = SchedulerConfig::new()
            .initial_capacity(capacity)
            .stack_size(crate::memory::MIN_STACK_SIZE);
        let mut table = ThreadTable::new(&config);
        table.register_main();
        table
    }

    fn create(table: &mut ThreadTable) -> ThreadId {
        table.create_slot(Box::new(|| {}), never).unwrap()
    }

    fn terminate(table: &mut ThreadTable, id: ThreadId, code: u8) {
        table.get_mut(id).unwrap().status = Some(ExitStatus::Exited(code));
    }

    #[test]
    fn test_main_slot() {
        let table = table(8);
        let main = table.live(ThreadId::MAIN).unwrap();
        assert!(main.is_running());
        assert!(main.stack().is_none());
        assert!(main.context().is_some());
        assert_eq!(table.running(), Some(ThreadId::MAIN));
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut table = table(8);
        let ids: Vec<u32> = (0..5).map(|_| create(&mut table).as_u32()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(table.used(), 6);
        assert_eq!(table.live_count(), 6);
    }

    #[test]
    fn test_reuses_lowest_available() {
        let mut table = table(8);
        let a = create(&mut table);
        let b = create(&mut table);
        let _c = create(&mut table);

        terminate(&mut table, b, 0);
        table.reclaim(b);
        terminate(&mut table, a, 0);
        table.reclaim(a);
        assert!(table.live(a).is_none());
        assert!(table.get(a).is_some());

        assert_eq!(create(&mut table), a);
        assert_eq!(create(&mut table), b);
        assert_eq!(create(&mut table).as_u32(), 4);
    }

    #[test]
    fn test_reclaim_releases_resources_keeps_status() {
        let mut table = table(8);
        let id = create(&mut table);
        terminate(&mut table, id, 42);
        let released = table.reclaim(id);
        assert!(!released.is_empty());

        let tcb = table.get(id).unwrap();
        assert!(tcb.is_available());
        assert!(tcb.stack().is_none());
        assert!(tcb.context().is_none());
        assert_eq!(tcb.status(), Some(ExitStatus::Exited(42)));
    }

    #[test]
    fn test_release_resources_keeps_slot() {
        let mut table = table(8);
        let id = create(&mut table);
        let released = table.release_resources(id);
        assert!(!released.is_empty());
        drop(released);

        let tcb = table.live(id).unwrap();
        assert!(tcb.stack().is_none());
        assert!(tcb.context().is_none());

        // A later reclaim does not release twice
        table.get_mut(id).unwrap().status = Some(ExitStatus::Cancelled);
        assert!(table.reclaim(id).is_empty());
        assert!(table.get(id).unwrap().is_available());
    }

    #[test]
    fn test_released_entry_outlives_table_borrow() {
        use std::rc::Rc;

        let mut table = table(8);
        let token = Rc::new(());
        let held = token.clone();
        let id = table.create_slot(Box::new(move || drop(held)), never).unwrap();

        let released = table.release_resources(id);
        assert_eq!(Rc::strong_count(&token), 2);
        drop(released);
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn test_stack_size_clamped_to_minimum() {
        let mut config = SchedulerConfig::new();
        config.stack_size = 1;
        let mut table = ThreadTable::new(&config);
        table.register_main();
        let id = create(&mut table);
        let stack = table.get(id).unwrap().stack().unwrap();
        assert!(stack.usable_size() >= MIN_STACK_SIZE);
    }

    #[test]
    fn test_growth_is_geometric() {
        let mut table = table(4);
        assert_eq!(table.capacity(), 4);

        // main + 3 = 4 used, 4 * 100 > 4 * 90 -> next create grows to 16
        for _ in 0..3 {
            create(&mut table);
        }
        assert_eq!(table.capacity(), 4);
        create(&mut table);
        assert_eq!(table.capacity(), 16);

        // 15 used > 14.4 -> grows to 64
        while table.used() < 15 {
            create(&mut table);
        }
        assert_eq!(table.capacity(), 16);
        create(&mut table);
        assert_eq!(table.capacity(), 64);
    }

    #[test]
    fn test_growth_preserves_stacks_and_contexts() {
        let mut table = table(4);
        let first: Vec<ThreadId> = (0..3).map(|_| create(&mut table)).collect();
        let before: Vec<(*mut u8, *const _)> = first
            .iter()
            .map(|&id| {
                let tcb = table.get(id).unwrap();
                (tcb.stack().unwrap().top(), tcb.context().unwrap().as_ptr())
            })
            .collect();

        for _ in 0..20 {
            create(&mut table);
        }
        assert!(table.capacity() > 4);

        for (id, (top, ctx)) in first.iter().zip(before) {
            let tcb = table.live(*id).unwrap();
            assert_eq!(tcb.id(), *id);
            assert_eq!(tcb.stack().unwrap().top(), top);
            assert_eq!(tcb.context().unwrap().as_ptr(), ctx);
        }
    }
}
