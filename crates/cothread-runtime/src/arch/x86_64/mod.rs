//! x86_64 context switching implementation
//!
//! Only the System V callee-saved state is switched: every switch happens
//! at a call boundary, so the caller has already spilled the rest. That
//! state includes the MXCSR and x87 control words, so a thread's rounding
//! mode and exception masks stay its own.

use std::arch::naked_asm;

/// Saved registers of a suspended thread
///
/// Offsets are fixed for the assembly in `context_switch`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SavedRegs {
    pub rsp: u64, // 0x00
    pub rip: u64, // 0x08
    pub rbx: u64, // 0x10
    pub rbp: u64, // 0x18
    pub r12: u64, // 0x20
    pub r13: u64, // 0x28
    pub r14: u64, // 0x30
    pub r15: u64, // 0x38
    pub mxcsr: u32, // 0x40
    pub fpucw: u16, // 0x44
    _pad: u16,
}

/// MXCSR at process start: all exceptions masked, round to nearest
pub const DEFAULT_MXCSR: u32 = 0x1F80;

/// x87 control word at process start: all exceptions masked, 64-bit precision
pub const DEFAULT_FPUCW: u16 = 0x037F;

/// Initialize a new thread's context
///
/// Sets up the registers so that when switched to, execution begins in
/// the trampoline, which calls `entry_fn(entry_arg)` on the new stack.
///
/// # Safety
///
/// `regs` must point to valid SavedRegs memory.
/// `stack_top` must be the top of a mapped, writable stack.
#[inline]
pub unsafe fn init_context(
    regs: *mut SavedRegs,
    stack_top: *mut u8,
    entry_fn: usize,
    entry_arg: usize,
) {
    // The trampoline is entered by `jmp` with rsp 16-byte aligned; its
    // `call` then leaves rsp at 8 mod 16 in the callee, as the ABI expects.
    let aligned_sp = (stack_top as usize) & !0xF;

    let regs = &mut *regs;
    regs.rsp = aligned_sp as u64;
    regs.rip = thread_entry_trampoline as usize as u64;
    regs.rbx = 0;
    regs.rbp = 0; // terminates frame-pointer walks
    regs.r12 = entry_fn as u64;
    regs.r13 = entry_arg as u64;
    regs.r14 = 0;
    regs.r15 = 0;
    regs.mxcsr = DEFAULT_MXCSR;
    regs.fpucw = DEFAULT_FPUCW;
}

/// Trampoline that calls the entry function with its argument
///
/// The entry function never returns; `ud2` traps if it ever does.
#[unsafe(naked)]
unsafe extern "C" fn thread_entry_trampoline() {
    naked_asm!(
        "mov rdi, r13",
        "call r12",
        "ud2",
    );
}

/// Perform a context switch
///
/// Saves callee-saved registers and FP control words to `old_regs` and
/// loads them from `new_regs`.
/// Returns when some other thread switches back to `old_regs`.
///
/// # Safety
///
/// Both pointers must be valid; `new_regs` must hold a primed or
/// previously saved context whose stack is still mapped.
#[unsafe(naked)]
pub unsafe extern "C" fn context_switch(
    _old_regs: *mut SavedRegs,
    _new_regs: *const SavedRegs,
) {
    naked_asm!(
        // Save callee-saved registers to old_regs (RDI)
        "mov [rdi + 0x00], rsp",
        "lea rax, [rip + 2f]",
        "mov [rdi + 0x08], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        "stmxcsr dword ptr [rdi + 0x40]",
        "fnstcw word ptr [rdi + 0x44]",
        // Load callee-saved registers from new_regs (RSI)
        "mov rsp, [rsi + 0x00]",
        "mov rax, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov rbp, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        "ldmxcsr dword ptr [rsi + 0x40]",
        "fldcw word ptr [rsi + 0x44]",
        // Jump to new RIP
        "jmp rax",
        // Resume point of a saved context
        "2:",
        "ret",
    );
}
