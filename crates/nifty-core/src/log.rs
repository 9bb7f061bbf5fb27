//! Kernel-style log macros
//!
//! Thread-safe `stderr` logging with a level prefix and, where the
//! caller supplies one, the handle under discussion — `[INFO] [h42]
//! pool: spawned worker 3`. Zero-dependency and env-driven, following
//! the same `printk`-flavored convention the teacher's own `kprint`
//! module uses, rather than pulling in `log`/`tracing`.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use crate::env;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static FLUSH: AtomicBool = AtomicBool::new(false);
static TIME: AtomicBool = AtomicBool::new(false);
static START: OnceLock<Instant> = OnceLock::new();

fn ensure_init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    START.get_or_init(Instant::now);
    LEVEL.store(env::log_level() as u8, Ordering::Relaxed);
    FLUSH.store(env::log_flush_enabled(), Ordering::Relaxed);
    TIME.store(env::log_time_enabled(), Ordering::Relaxed);
}

/// Programmatically override the level set from `NIFTY_LOG_LEVEL`, e.g.
/// to silence logging in a test.
pub fn set_level(level: LogLevel) {
    ensure_init();
    LEVEL.store(level as u8, Ordering::Relaxed);
}

fn level_enabled(level: LogLevel) -> bool {
    ensure_init();
    (level as u8) <= LEVEL.load(Ordering::Relaxed)
}

fn elapsed_ns() -> u64 {
    ensure_init();
    START.get().expect("ensure_init sets START").elapsed().as_nanos() as u64
}

#[doc(hidden)]
pub fn _log_impl(level: LogLevel, handle: Option<crate::handle::Handle>, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let _ = write!(out, "{} ", level.prefix());
    if TIME.load(Ordering::Relaxed) {
        let _ = write!(out, "[{}] ", elapsed_ns());
    }
    match handle {
        Some(h) if h.is_some() => {
            let _ = write!(out, "[h{}] ", h);
        }
        _ => {}
    }
    let _ = out.write_fmt(args);
    let _ = out.write_all(b"\n");
    if FLUSH.load(Ordering::Relaxed) {
        let _ = out.flush();
    }
}

/// Error-level log line, optionally tagged with a handle for context.
#[macro_export]
macro_rules! nifty_error {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Error, None, format_args!($($arg)*))
    };
}

/// Warn-level log line.
#[macro_export]
macro_rules! nifty_warn {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Warn, None, format_args!($($arg)*))
    };
}

/// Info-level log line.
#[macro_export]
macro_rules! nifty_info {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Info, None, format_args!($($arg)*))
    };
}

/// Debug-level log line.
#[macro_export]
macro_rules! nifty_debug {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Debug, None, format_args!($($arg)*))
    };
}

/// Trace-level log line.
#[macro_export]
macro_rules! nifty_trace {
    ($($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Trace, None, format_args!($($arg)*))
    };
}

/// Info-level log line tagged with the handle under discussion, e.g.
/// `nifty_info_h!(pool.handle(), "spawned worker {}", n)`.
#[macro_export]
macro_rules! nifty_info_h {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Info, Some($handle), format_args!($($arg)*))
    };
}

/// Debug-level log line tagged with a handle.
#[macro_export]
macro_rules! nifty_debug_h {
    ($handle:expr, $($arg:tt)*) => {
        $crate::log::_log_impl($crate::log::LogLevel::Debug, Some($handle), format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn macros_compile_and_respect_off() {
        set_level(LogLevel::Off);
        nifty_error!("err {}", 1);
        nifty_warn!("warn");
        nifty_info!("info");
        nifty_debug!("debug");
        nifty_trace!("trace");
        set_level(LogLevel::Info);
    }

    #[test]
    fn elapsed_ns_increases() {
        let a = elapsed_ns();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = elapsed_ns();
        assert!(b > a);
    }
}
