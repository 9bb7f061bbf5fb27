//! Environment variable utilities
//!
//! Generic `env_get<T>` helper for parsing environment variables with
//! defaults, plus typed readers for the toolkit's own `NIFTY_*` knobs.

use std::str::FromStr;

/// Get environment variable parsed as type `T`, or return `default`.
#[inline]
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Get environment variable as boolean.
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true; anything
/// else, including unset, returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as an optional parsed value.
#[inline]
pub fn env_get_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// `NIFTY_LOG_LEVEL`: off/error/warn/info/debug/trace, or the numeric 0-5
/// equivalent. Defaults to `info`.
pub fn log_level() -> crate::log::LogLevel {
    use crate::log::LogLevel;
    match std::env::var("NIFTY_LOG_LEVEL") {
        Ok(val) => match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        },
        Err(_) => LogLevel::Info,
    }
}

/// `NIFTY_LOG_TIME`: include a relative nanosecond timestamp in log lines.
pub fn log_time_enabled() -> bool {
    env_get_bool("NIFTY_LOG_TIME", false)
}

/// `NIFTY_LOG_FLUSH`: flush stderr after every log line.
pub fn log_flush_enabled() -> bool {
    env_get_bool("NIFTY_LOG_FLUSH", false)
}

/// `NIFTY_POOL_STACK_KB`: default worker stack size in KiB, used when a
/// `Pool` is created with `stack_size = 0`.
pub fn pool_stack_kb() -> u64 {
    env_get("NIFTY_POOL_STACK_KB", 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_get_falls_back_to_default() {
        let val: usize = env_get("__NIFTY_TEST_UNSET__", 42);
        assert_eq!(val, 42);
    }

    #[test]
    fn env_get_parses_set_value() {
        std::env::set_var("__NIFTY_TEST_NUM__", "123");
        let val: usize = env_get("__NIFTY_TEST_NUM__", 0);
        assert_eq!(val, 123);
        std::env::remove_var("__NIFTY_TEST_NUM__");
    }

    #[test]
    fn env_get_bool_variants() {
        for truthy in ["1", "true", "TRUE", "yes", "on"] {
            std::env::set_var("__NIFTY_TEST_BOOL__", truthy);
            assert!(env_get_bool("__NIFTY_TEST_BOOL__", false), "{truthy} should be truthy");
        }
        std::env::set_var("__NIFTY_TEST_BOOL__", "garbage");
        assert!(!env_get_bool("__NIFTY_TEST_BOOL__", false));
        std::env::remove_var("__NIFTY_TEST_BOOL__");
    }

    #[test]
    fn env_get_opt_none_when_unset() {
        let val: Option<usize> = env_get_opt("__NIFTY_TEST_UNSET__");
        assert!(val.is_none());
    }
}
