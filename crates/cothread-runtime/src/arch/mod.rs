//! Architecture-specific context switching
//!
//! Each architecture provides:
//! - `SavedRegs` - the callee-saved register set plus stack pointer and
//!   resume address, laid out for the assembly below
//! - `init_context` - prime a register set so that switching to it starts
//!   the thread trampoline on a fresh stack
//! - `context_switch` - save the running registers and load another set

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub mod x86_64;
    } else if #[cfg(target_arch = "aarch64")] {
        pub mod aarch64;
    }
}
