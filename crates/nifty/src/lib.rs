//! # nifty
//!
//! The Nifty concurrency toolkit: a handle-based object runtime
//! (`nifty-core`), a bounded blocking queue (`nifty-queue`), a
//! dynamically-sized worker pool built on it (`nifty-pool`), and a
//! single-threaded min-heap task scheduler (`nifty-task`), re-exported
//! behind one crate.
//!
//! ## Quick start
//!
//! ```ignore
//! use nifty::{Pool, Timeout};
//! use std::time::Duration;
//!
//! let handle = Pool::create(64, 4, 0);
//! let pool = Pool::lookup(handle).unwrap();
//! let total = pool.submit_wait(Timeout::After(Duration::from_secs(1)), || 6 * 7).unwrap();
//! assert_eq!(total, 42);
//! pool.shutdown(Timeout::Infinite).unwrap();
//! ```

#![allow(dead_code)]

// Re-export the object runtime
pub use nifty_core::{
    apply, cast, create, discard, extend, is_valid_class_path, live_count, lookup, lookup_as, prefix_matches, AnyObject,
    CoreObject, Handle, HandleTable, NiftyError, NiftyResult, ObjectHeader, Timeout, Timespec,
};

// Re-export logging macros and configuration
pub use nifty_core::{nifty_debug, nifty_debug_h, nifty_error, nifty_info, nifty_info_h, nifty_trace, nifty_warn};
pub use nifty_core::env::{log_flush_enabled, log_time_enabled, log_level, pool_stack_kb};
pub use nifty_core::log::{set_level, LogLevel};

// Re-export the blocking queue
pub use nifty_queue::{Queue, QueueState, CLASS as QUEUE_CLASS};

// Re-export the worker pool
pub use nifty_pool::{Pool, CLASS as POOL_CLASS};

// Re-export the task scheduler
pub use nifty_task::{cancel, schedule_in, task_this, CLASS as TASK_CLASS};

use std::sync::Arc;
use std::time::Duration;

/// Convenience wrapper bundling a single `Pool` handle with the toolkit's
/// free-standing task scheduler, for callers who want one object to hold
/// onto rather than juggling a raw `Handle`.
pub struct Toolkit {
    pool: Arc<Pool>,
}

impl Toolkit {
    /// Create a pool-backed toolkit. `backlog_limit == 0` means
    /// unbounded; below-minimum arguments are silently raised, per
    /// `Pool::create`.
    pub fn new(backlog_limit: usize, max_threads: usize, stack_size: usize) -> NiftyResult<Self> {
        let handle = Pool::create(backlog_limit, max_threads, stack_size);
        let pool = Pool::lookup(handle)?;
        Ok(Toolkit { pool })
    }

    /// Submit work to the pool, blocking indefinitely if the backlog is
    /// full.
    pub fn submit<F>(&self, work: F) -> NiftyResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit(work, Timeout::Infinite)
    }

    /// Submit work and wait up to `timeout` for its result.
    pub fn submit_wait<R, F>(&self, timeout: Timeout, work: F) -> NiftyResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        self.pool.submit_wait(timeout, work)
    }

    /// Schedule a one-shot or periodic task on the shared scheduler.
    /// `interval == Duration::ZERO` means one-shot.
    pub fn schedule<A, F>(&self, delay: Duration, interval: Duration, argument: A, function: F) -> Handle
    where
        A: Send + 'static,
        F: FnMut(&mut (dyn std::any::Any + Send)) + Send + 'static,
    {
        schedule_in(delay, interval, argument, function)
    }

    /// Number of worker threads currently running.
    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }

    /// Number of work items currently queued but not yet picked up.
    pub fn backlog(&self) -> usize {
        self.pool.backlog()
    }

    /// Shut the pool down, waiting up to `timeout` for already-enqueued
    /// items to finish.
    pub fn shutdown(&self, timeout: Timeout) -> NiftyResult<()> {
        self.pool.shutdown(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolkit_submit_wait_roundtrips_through_the_pool() {
        let toolkit = Toolkit::new(8, 2, 0).unwrap();
        let result = toolkit.submit_wait(Timeout::After(Duration::from_secs(1)), || 6 * 7).unwrap();
        assert_eq!(result, 42);
        toolkit.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn toolkit_schedule_then_cancel_returns_the_argument() {
        let toolkit = Toolkit::new(8, 2, 0).unwrap();
        let handle = toolkit.schedule(Duration::from_secs(60), Duration::ZERO, 9u32, |_| {});
        let arg: Option<u32> = cancel(handle);
        assert_eq!(arg, Some(9));
        toolkit.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }
}
