//! Time representation shared across the toolkit
//!
//! Per spec: seconds + nanoseconds, normalized so `nanos` lands in
//! `[0, 1_000_000_000)`. Internally everything that actually schedules
//! (the task heap, queue/pool timeouts) works in `std::time::{Instant,
//! Duration}` — `Timespec` exists for the external, normalized-pair
//! surface the spec describes.

use std::time::Duration;

/// A normalized seconds/nanoseconds pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timespec {
    pub secs: u64,
    pub nanos: u32,
}

const NANOS_PER_SEC: u32 = 1_000_000_000;

impl Timespec {
    /// Construct from raw seconds/nanos, normalizing any nanos overflow.
    pub fn new(secs: u64, nanos: u32) -> Self {
        let extra_secs = (nanos / NANOS_PER_SEC) as u64;
        Timespec {
            secs: secs + extra_secs,
            nanos: nanos % NANOS_PER_SEC,
        }
    }
}

impl From<Duration> for Timespec {
    fn from(d: Duration) -> Self {
        Timespec::new(d.as_secs(), d.subsec_nanos())
    }
}

impl From<Timespec> for Duration {
    fn from(t: Timespec) -> Self {
        Duration::new(t.secs, t.nanos)
    }
}

/// A bounded wait, per spec §4.2: negative waits indefinitely, zero
/// polls without blocking, positive waits up to that many seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timeout {
    Infinite,
    Poll,
    After(Duration),
}

impl Timeout {
    /// Mirror the spec's `timeout<0 / ==0 / >0` convention for callers
    /// coming from a signed-seconds API.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds < 0.0 {
            Timeout::Infinite
        } else if seconds == 0.0 {
            Timeout::Poll
        } else {
            Timeout::After(Duration::from_secs_f64(seconds))
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Timeout::Poll
        } else {
            Timeout::After(d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_nanos_overflow() {
        let t = Timespec::new(1, 1_500_000_000);
        assert_eq!(t.secs, 2);
        assert_eq!(t.nanos, 500_000_000);
    }

    #[test]
    fn duration_roundtrip() {
        let d = Duration::new(3, 250);
        let t = Timespec::from(d);
        assert_eq!(Duration::from(t), d);
    }

    #[test]
    fn timeout_from_seconds_convention() {
        assert_eq!(Timeout::from_seconds(-1.0), Timeout::Infinite);
        assert_eq!(Timeout::from_seconds(0.0), Timeout::Poll);
        assert!(matches!(Timeout::from_seconds(2.5), Timeout::After(_)));
    }
}
