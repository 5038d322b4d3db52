//! # cothread-runtime
//!
//! Platform-specific runtime for the cothread cooperative scheduler.
//!
//! This crate provides:
//! - Stack memory (mmap with a guard page)
//! - Context switching (architecture-specific assembly)
//! - The thread table and FIFO ready queue
//! - The per-OS-thread scheduler and its public operations

pub mod config;
pub mod memory;
pub mod arch;
pub mod context;
pub mod table;
pub mod ready_queue;
pub mod scheduler;
pub mod tls;

// Re-exports
pub use config::{SchedulerConfig, LastExitPolicy};
pub use context::Context;
pub use memory::Stack;
pub use scheduler::Scheduler;
pub use table::ThreadTable;

cfg_if::cfg_if! {
    if #[cfg(not(unix))] {
        compile_error!("Unsupported platform");
    }
}

// Architecture detection
cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub use arch::x86_64 as current_arch;
    } else if #[cfg(target_arch = "aarch64")] {
        pub use arch::aarch64 as current_arch;
    } else {
        compile_error!("Unsupported architecture");
    }
}

/// Log and terminate the process.
///
/// Used for resource exhaustion and scheduler invariant violations, neither
/// of which a caller can recover from.
#[macro_export]
#[doc(hidden)]
macro_rules! fatal {
    ($($arg:tt)*) => {{
        ::cothread_core::kerror!("fatal: {}", format_args!($($arg)*));
        ::std::process::abort()
    }};
}
