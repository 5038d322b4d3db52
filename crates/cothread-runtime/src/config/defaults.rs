//! Compile-time configuration defaults

use super::LastExitPolicy;

/// Thread table slots reserved by `init`
pub const INITIAL_CAPACITY: usize = 256;

/// Grow the table once more than this percentage of slots has been used
pub const LOAD_FACTOR_PERCENT: usize = 90;

/// Capacity multiplier applied on growth
pub const GROWTH_FACTOR: usize = 4;

/// Usable stack bytes per thread
///
/// Well above `SIGSTKSZ`: formatting, logging and panic reporting all run
/// on thread stacks.
pub const STACK_SIZE: usize = 256 * 1024;

/// Process exit code when the last runnable thread exits
pub const LAST_EXIT: LastExitPolicy = LastExitPolicy::Zero;

/// Raise the log level to debug on init
pub const DEBUG_LOGGING: bool = false;
