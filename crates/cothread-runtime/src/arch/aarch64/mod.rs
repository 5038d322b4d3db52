//! aarch64 context switching implementation
//!
//! Switches the AAPCS64 callee-saved set: x19-x28, fp, lr, sp, the low
//! halves of v8-v15, and FPCR (rounding mode and trap enables).

use std::arch::naked_asm;

/// Saved registers of a suspended thread
///
/// Offsets are fixed for the assembly in `context_switch`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SavedRegs {
    pub sp: u64,       // 0x00
    pub lr: u64,       // 0x08
    pub x: [u64; 10],  // 0x10 x19..x28
    pub fp: u64,       // 0x60
    pub d: [u64; 8],   // 0x68 d8..d15
    pub fpcr: u64,     // 0xa8
}

/// Initialize a new thread's context
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
    let regs = &mut *regs;
    *regs = SavedRegs::default();
    regs.sp = ((stack_top as usize) & !0xF) as u64;
    regs.lr = thread_entry_trampoline as usize as u64;
    regs.x[0] = entry_fn as u64;  // x19
    regs.x[1] = entry_arg as u64; // x20
}

/// Trampoline that calls the entry function with its argument
#[unsafe(naked)]
unsafe extern "C" fn thread_entry_trampoline() {
    naked_asm!(
        "mov x0, x20",
        "blr x19",
        "brk #0x1",
    );
}

/// Perform a context switch
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
        // Save to old_regs (x0)
        "mov x9, sp",
        "str x9, [x0, #0x00]",
        "str x30, [x0, #0x08]",
        "stp x19, x20, [x0, #0x10]",
        "stp x21, x22, [x0, #0x20]",
        "stp x23, x24, [x0, #0x30]",
        "stp x25, x26, [x0, #0x40]",
        "stp x27, x28, [x0, #0x50]",
        "str x29, [x0, #0x60]",
        "stp d8, d9, [x0, #0x68]",
        "stp d10, d11, [x0, #0x78]",
        "stp d12, d13, [x0, #0x88]",
        "stp d14, d15, [x0, #0x98]",
        "mrs x9, fpcr",
        "str x9, [x0, #0xa8]",
        // Load from new_regs (x1)
        "ldr x9, [x1, #0x00]",
        "mov sp, x9",
        "ldr x30, [x1, #0x08]",
        "ldp x19, x20, [x1, #0x10]",
        "ldp x21, x22, [x1, #0x20]",
        "ldp x23, x24, [x1, #0x30]",
        "ldp x25, x26, [x1, #0x40]",
        "ldp x27, x28, [x1, #0x50]",
        "ldr x29, [x1, #0x60]",
        "ldp d8, d9, [x1, #0x68]",
        "ldp d10, d11, [x1, #0x78]",
        "ldp d12, d13, [x1, #0x88]",
        "ldp d14, d15, [x1, #0x98]",
        "ldr x9, [x1, #0xa8]",
        "msr fpcr, x9",
        // Resume at lr (saved return address or the trampoline)
        "ret",
    );
}
