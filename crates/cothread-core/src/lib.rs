//! # cothread-core
//!
//! Core types for the cothread cooperative scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! Stacks, register save areas and the scheduler itself live in
//! `cothread-runtime`.
//!
//! ## Modules
//!
//! - `id` - Logical thread identifier type
//! - `state` - Lifecycle state and exit status types
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod state;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::ThreadId;
pub use state::{ThreadState, ExitStatus};
pub use error::{SchedError, SchedResult, MemoryError, ConfigError};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

/// Constants shared by the runtime and the public facade
pub mod constants {
    /// Id of the thread that called `init` (runs on the host OS stack)
    pub const MAIN_THREAD: u32 = 0;

    /// Raw status reported for a cancelled thread.
    ///
    /// Lies outside the 0..=255 exit-code range, so it can never be
    /// confused with `exit(128)` or a `128 + signal` style code.
    pub const CANCELLED_STATUS: i32 = 0x100;

    /// Raw error sentinel of the integer view of the API
    pub const ERROR_STATUS: i32 = -1;

    /// Exit code recorded for a thread whose entry closure panicked
    pub const PANIC_STATUS: u8 = 101;

    /// No-thread sentinel value
    pub const THREAD_NONE: u32 = u32::MAX;
}
