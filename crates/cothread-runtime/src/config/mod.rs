//! Scheduler configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Example
//!
//! ```rust,ignore
//! use cothread_runtime::config::SchedulerConfig;
//!
//! // Use defaults with env overrides
//! let config = SchedulerConfig::from_env();
//!
//! // Or customize programmatically
//! let config = SchedulerConfig::from_env()
//!     .initial_capacity(16)
//!     .stack_size(128 * 1024);
//! ```

pub mod defaults;

use std::str::FromStr;
use cothread_core::env::{env_get, env_get_bool};
use cothread_core::error::ConfigError;
use crate::memory::MIN_STACK_SIZE;

/// What the process exits with when the last runnable thread calls `exit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastExitPolicy {
    /// Always exit with 0, discarding the thread's own status
    Zero,
    /// Exit with the status the last thread passed to `exit`
    Status,
}

impl LastExitPolicy {
    /// Process exit code for a final `exit(status)`
    #[inline]
    pub fn process_code(&self, status: u8) -> i32 {
        match self {
            LastExitPolicy::Zero => 0,
            LastExitPolicy::Status => status as i32,
        }
    }
}

impl FromStr for LastExitPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zero" | "0" => Ok(LastExitPolicy::Zero),
            "status" => Ok(LastExitPolicy::Status),
            _ => Err(ConfigError::InvalidValue("last_exit must be zero or status")),
        }
    }
}

/// Scheduler configuration with builder pattern.
///
/// Use `from_env()` to start with compile-time defaults and apply
/// any environment variable overrides.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Thread table slots reserved by `init`
    pub initial_capacity: usize,
    /// Growth threshold, in percent of capacity
    pub load_factor_percent: usize,
    /// Capacity multiplier on growth
    pub growth_factor: usize,
    /// Usable stack bytes per thread; the thread table raises anything
    /// below `SIGSTKSZ` to it
    pub stack_size: usize,
    /// Process exit code policy for the last runnable thread
    pub last_exit: LastExitPolicy,
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `COTHREAD_INITIAL_CAPACITY` - Initial thread table slots
    /// - `COTHREAD_LOAD_FACTOR` - Growth threshold in percent
    /// - `COTHREAD_GROWTH_FACTOR` - Capacity multiplier on growth
    /// - `COTHREAD_STACK_SIZE` - Stack bytes per thread (raised to `SIGSTKSZ` if smaller)
    /// - `COTHREAD_LAST_EXIT` - `zero` or `status`
    /// - `COTHREAD_DEBUG` - Enable debug logging (0/1)
    pub fn from_env() -> Self {
        Self {
            initial_capacity: env_get("COTHREAD_INITIAL_CAPACITY", defaults::INITIAL_CAPACITY),
            load_factor_percent: env_get("COTHREAD_LOAD_FACTOR", defaults::LOAD_FACTOR_PERCENT),
            growth_factor: env_get("COTHREAD_GROWTH_FACTOR", defaults::GROWTH_FACTOR),
            stack_size: env_get("COTHREAD_STACK_SIZE", defaults::STACK_SIZE).max(MIN_STACK_SIZE),
            last_exit: env_get("COTHREAD_LAST_EXIT", defaults::LAST_EXIT),
            debug_logging: env_get_bool("COTHREAD_DEBUG", defaults::DEBUG_LOGGING),
        }
    }

    /// Create config with explicit defaults (no env override).
    /// Useful for testing or when you want full control.
    pub fn new() -> Self {
        Self {
            initial_capacity: defaults::INITIAL_CAPACITY,
            load_factor_percent: defaults::LOAD_FACTOR_PERCENT,
            growth_factor: defaults::GROWTH_FACTOR,
            stack_size: defaults::STACK_SIZE,
            last_exit: defaults::LAST_EXIT,
            debug_logging: defaults::DEBUG_LOGGING,
        }
    }

    // Builder methods

    pub fn initial_capacity(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self
    }

    pub fn load_factor_percent(mut self, percent: usize) -> Self {
        self.load_factor_percent = percent;
        self
    }

    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Usable stack bytes per thread, never less than `SIGSTKSZ`
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.max(MIN_STACK_SIZE);
        self
    }

    pub fn last_exit(mut self, policy: LastExitPolicy) -> Self {
        self.last_exit = policy;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::InvalidValue("initial_capacity must be > 0"));
        }
        if self.load_factor_percent == 0 || self.load_factor_percent > 100 {
            return Err(ConfigError::InvalidValue("load_factor_percent must be in 1..=100"));
        }
        if self.growth_factor < 2 {
            return Err(ConfigError::InvalidValue("growth_factor must be >= 2"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("cothread configuration:");
        eprintln!("  initial_capacity:     {}", self.initial_capacity);
        eprintln!("  load_factor_percent:  {}", self.load_factor_percent);
        eprintln!("  growth_factor:        {}", self.growth_factor);
        eprintln!("  stack_size:           {}", self.stack_size);
        eprintln!("  last_exit:            {:?}", self.last_exit);
        eprintln!("  debug_logging:        {}", self.debug_logging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = SchedulerConfig::new();
        assert_eq!(config.initial_capacity, 256);
        assert_eq!(config.load_factor_percent, 90);
        assert_eq!(config.growth_factor, 4);
        assert_eq!(config.last_exit, LastExitPolicy::Zero);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .initial_capacity(8)
            .growth_factor(2)
            .last_exit(LastExitPolicy::Status);

        assert_eq!(config.initial_capacity, 8);
        assert_eq!(config.growth_factor, 2);
        assert_eq!(config.last_exit, LastExitPolicy::Status);
    }

    #[test]
    fn test_validation() {
        assert!(SchedulerConfig::new().initial_capacity(0).validate().is_err());
        assert!(SchedulerConfig::new().load_factor_percent(0).validate().is_err());
        assert!(SchedulerConfig::new().load_factor_percent(101).validate().is_err());
        assert!(SchedulerConfig::new().growth_factor(1).validate().is_err());
        assert_eq!(SchedulerConfig::new().stack_size(16).stack_size, MIN_STACK_SIZE);
        assert!(SchedulerConfig::new().stack_size(16).validate().is_ok());
    }

    #[test]
    fn test_last_exit_parse() {
        assert_eq!("zero".parse::<LastExitPolicy>(), Ok(LastExitPolicy::Zero));
        assert_eq!(" Status ".parse::<LastExitPolicy>(), Ok(LastExitPolicy::Status));
        assert!("always".parse::<LastExitPolicy>().is_err());
        assert_eq!(LastExitPolicy::Zero.process_code(7), 0);
        assert_eq!(LastExitPolicy::Status.process_code(7), 7);
    }
}
