//! Error types for the cothread scheduler

use core::fmt;
use crate::id::ThreadId;
use crate::constants::ERROR_STATUS;

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors returned by scheduler operations
///
/// Every variant is a caller-side contract violation or a setup error.
/// Resource exhaustion and scheduler invariant violations are not
/// represented here: they terminate the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// `init` has not been called on this OS thread
    NotInitialized,

    /// `init` was already called on this OS thread
    AlreadyInitialized,

    /// The id does not name a slot in use
    InvalidThread(ThreadId),

    /// A thread tried to join itself
    JoinSelf,

    /// Another thread is already joining the target
    AlreadyJoined(ThreadId),

    /// A thread tried to cancel itself
    CancelSelf,

    /// The target already exited or was cancelled
    AlreadyTerminated(ThreadId),

    /// `yield_now` with an empty ready queue
    NothingToRun,

    /// `join` would block with no runnable thread left to wake the caller
    WouldDeadlock,

    /// Operation only permitted on the main thread
    NotMainThread,

    /// Invalid scheduler configuration
    Config(ConfigError),
}

impl SchedError {
    /// Integer view of an error: always the `-1` sentinel
    #[inline]
    pub const fn code(&self) -> i32 {
        ERROR_STATUS
    }
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::NotInitialized => write!(f, "scheduler not initialized"),
            SchedError::AlreadyInitialized => write!(f, "scheduler already initialized"),
            SchedError::InvalidThread(id) => write!(f, "no thread with id {}", id),
            SchedError::JoinSelf => write!(f, "a thread cannot join itself"),
            SchedError::AlreadyJoined(id) => write!(f, "thread {} already has a joiner", id),
            SchedError::CancelSelf => write!(f, "a thread cannot cancel itself"),
            SchedError::AlreadyTerminated(id) => write!(f, "thread {} already terminated", id),
            SchedError::NothingToRun => write!(f, "no other thread is ready"),
            SchedError::WouldDeadlock => write!(f, "join would block forever"),
            SchedError::NotMainThread => write!(f, "only the main thread may do this"),
            SchedError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SchedError {}

/// Memory-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// mmap failed
    AllocationFailed,

    /// mprotect of the guard page failed
    ProtectionFailed,

    /// munmap failed
    ReleaseFailed,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AllocationFailed => write!(f, "stack allocation failed"),
            MemoryError::ProtectionFailed => write!(f, "guard page protection failed"),
            MemoryError::ReleaseFailed => write!(f, "stack release failed"),
        }
    }
}

impl std::error::Error for MemoryError {}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for SchedError {
    fn from(e: ConfigError) -> Self {
        SchedError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SchedError::AlreadyJoined(ThreadId::new(3));
        assert_eq!(format!("{}", e), "thread 3 already has a joiner");

        let e = MemoryError::AllocationFailed;
        assert_eq!(format!("{}", e), "stack allocation failed");

        let e = SchedError::Config(ConfigError::InvalidValue("growth_factor must be >= 2"));
        assert_eq!(format!("{}", e), "Invalid config: growth_factor must be >= 2");
    }

    #[test]
    fn test_error_conversion() {
        let sched_err: SchedError = ConfigError::InvalidValue("x").into();
        assert!(matches!(sched_err, SchedError::Config(_)));
    }

    #[test]
    fn test_error_code_is_sentinel() {
        assert_eq!(SchedError::JoinSelf.code(), -1);
        assert_eq!(SchedError::NothingToRun.code(), -1);
    }
}
