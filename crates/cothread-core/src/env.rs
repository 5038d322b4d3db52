//! Environment variable utilities
//!
//! Typed lookups with defaults, used by the runtime configuration.
//!
//! # Usage
//!
//! ```ignore
//! use cothread_core::env::{env_get, env_get_bool};
//!
//! let capacity: usize = env_get("COTHREAD_INITIAL_CAPACITY", 256);
//! let debug: bool = env_get_bool("COTHREAD_DEBUG", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Unset variables and values that fail to parse both yield `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Any other value is false; an unset variable returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as optional value
///
/// Returns `Some(T)` if the variable is set and parses successfully
/// (surrounding whitespace ignored), `None` otherwise.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as string, or return default
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check if environment variable is set (regardless of value)
#[inline]
pub fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_returns_default() {
        let val: usize = env_get("__COTHREAD_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_bool("__COTHREAD_TEST_UNSET__", true));
        assert!(env_get_opt::<usize>("__COTHREAD_TEST_UNSET__").is_none());
        assert_eq!(env_get_str("__COTHREAD_TEST_UNSET__", "zero"), "zero");
        assert!(!env_is_set("__COTHREAD_TEST_UNSET__"));
    }

    #[test]
    fn test_env_get_parses_and_trims() {
        std::env::set_var("__COTHREAD_TEST_NUM__", " 123 ");
        let val: usize = env_get("__COTHREAD_TEST_NUM__", 0);
        assert_eq!(val, 123);
        std::env::remove_var("__COTHREAD_TEST_NUM__");
    }

    #[test]
    fn test_env_get_invalid_parse() {
        std::env::set_var("__COTHREAD_TEST_INVALID__", "lots");
        let val: usize = env_get("__COTHREAD_TEST_INVALID__", 99);
        assert_eq!(val, 99);
        std::env::remove_var("__COTHREAD_TEST_INVALID__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        for (raw, expected) in [("1", true), ("TRUE", true), ("on", true), ("0", false), ("garbage", false)] {
            std::env::set_var("__COTHREAD_TEST_BOOL__", raw);
            assert_eq!(env_get_bool("__COTHREAD_TEST_BOOL__", !expected), expected, "{}", raw);
        }
        std::env::remove_var("__COTHREAD_TEST_BOOL__");
    }
}
