//! Dynamically-sized worker `Pool`, a `Queue` subclass
//!
//! Grounded on the teacher's `WorkerPool::start` thread-spawn loop
//! (`thread::Builder` with a named, stack-sized spawn per worker) and
//! its dispatcher's idle-sleep-then-exit shape, generalized from a
//! fixed-size pool of io_uring dispatchers to an elastic pool executing
//! arbitrary `(fn, arg)` work items.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nifty_core::{extend, CoreObject, Handle, NiftyError, NiftyResult, ObjectHeader, Timeout};
use nifty_queue::{Queue, QueueState};

/// A boxed unit of work; the Rust shape of the spec's `(function, argument)`
/// pair — the argument is captured by the closure instead of passed
/// separately.
pub type WorkItem = Box<dyn FnOnce() + Send + 'static>;

/// Class path stamped on every `Pool`: `"core:queue:pool"`, so a cast
/// against `"core:queue"` still succeeds (I2 — the class path begins
/// with every ancestor's path).
pub const CLASS: &str = "core:queue:pool";

/// How long an idle worker waits for work before voluntarily exiting,
/// once more than one worker is running.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Pool {
    queue: Queue<WorkItem>,
    max_threads: usize,
    num_threads: AtomicUsize,
    idle_threads: AtomicUsize,
    stack_size: usize,
    idle_timeout: Duration,
}

impl CoreObject for Pool {
    fn header(&self) -> &ObjectHeader {
        self.queue.header()
    }
}

fn platform_min_stack() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            let min = unsafe { libc::sysconf(libc::_SC_THREAD_STACK_MIN) };
            if min > 0 { min as usize } else { 16 * 1024 }
        } else {
            16 * 1024
        }
    }
}

fn normalize_stack_size(requested: usize) -> usize {
    if requested == 0 {
        let from_env = nifty_core::env::pool_stack_kb();
        if from_env > 0 {
            return (from_env as usize * 1024).max(platform_min_stack());
        }
        return 0; // let thread::Builder pick its own default
    }
    requested.max(platform_min_stack())
}

impl Pool {
    fn new(backlog_limit: usize, max_threads: usize, stack_size: usize) -> Self {
        Pool {
            queue: Queue::new_with_class(backlog_limit.max(1), CLASS),
            max_threads: max_threads.max(1),
            num_threads: AtomicUsize::new(0),
            idle_threads: AtomicUsize::new(0),
            stack_size: normalize_stack_size(stack_size),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Test/internal hook for a short idle timeout so elastic shrink can
    /// be exercised without multi-second tests.
    #[cfg(test)]
    fn new_with_idle_timeout(backlog_limit: usize, max_threads: usize, stack_size: usize, idle_timeout: Duration) -> Self {
        let mut pool = Self::new(backlog_limit, max_threads, stack_size);
        pool.idle_timeout = idle_timeout;
        pool
    }

    /// `create(backlog_limit, max_threads, stack_size) -> pool`. Every
    /// below-minimum argument is silently raised to its minimum.
    pub fn create(backlog_limit: usize, max_threads: usize, stack_size: usize) -> Handle {
        nifty_core::create(Self::new(backlog_limit, max_threads, stack_size))
    }

    /// `Pool_lookup(handle) -> pool`, the typed-handle helper for `Pool`.
    pub fn lookup(handle: Handle) -> NiftyResult<Arc<Pool>> {
        nifty_core::lookup_as::<Pool>(handle, CLASS)
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads.load(Ordering::Acquire)
    }

    pub fn idle_threads(&self) -> usize {
        self.idle_threads.load(Ordering::Acquire)
    }

    pub fn backlog(&self) -> usize {
        self.queue.count()
    }

    /// `submit(fn, arg, timeout) -> status`: enqueue a work item. If no
    /// worker is idle and `num_threads < max_threads`, spawn a new
    /// detached worker first; backpressure otherwise follows `Queue`
    /// semantics.
    pub fn submit(self: &Arc<Self>, work: impl FnOnce() + Send + 'static, timeout: Timeout) -> NiftyResult<()> {
        self.maybe_spawn_worker();
        self.queue.enqueue(Box::new(work), timeout)
    }

    /// `submit_wait(timeout, fn, arg) -> result`: like `submit`, but
    /// blocks for the work item's result. The backlog enqueue itself
    /// waits indefinitely (a caller asking for the result has already
    /// committed to waiting); `timeout` bounds only the wait for
    /// completion.
    pub fn submit_wait<R: Send + 'static>(self: &Arc<Self>, timeout: Timeout, work: impl FnOnce() -> R + Send + 'static) -> NiftyResult<R> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.submit(
            move || {
                let _ = tx.send(work());
            },
            Timeout::Infinite,
        )?;
        match timeout {
            Timeout::Infinite => rx.recv().map_err(|_| NiftyError::Shutdown),
            Timeout::Poll => rx.try_recv().map_err(|_| NiftyError::Timeout),
            Timeout::After(d) => rx.recv_timeout(d).map_err(|_| NiftyError::Timeout),
        }
    }

    /// `shutdown(timeout)`: delegates to `Queue::shutdown`; items already
    /// enqueued are still executed by the remaining workers.
    pub fn shutdown(&self, timeout: Timeout) -> NiftyResult<()> {
        self.queue.shutdown(timeout)
    }

    fn maybe_spawn_worker(self: &Arc<Self>) {
        if self.idle_threads.load(Ordering::Acquire) > 0 {
            return;
        }
        loop {
            let current = self.num_threads.load(Ordering::Acquire);
            if current >= self.max_threads {
                return;
            }
            if self
                .num_threads
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
        self.spawn_worker();
    }

    fn spawn_worker(self: &Arc<Self>) {
        let pool = Arc::clone(self);
        let mut builder = thread::Builder::new().name(format!("nifty-pool-worker-{}", self.handle()));
        if self.stack_size > 0 {
            builder = builder.stack_size(self.stack_size);
        }
        builder
            .spawn(move || worker_loop(pool))
            .expect("failed to spawn pool worker thread");
    }
}

/// `dequeue` (with an idle timeout) -> execute `fn(arg)` -> loop. On
/// `Shutdown` the worker exits; on idle timeout, when more than one
/// worker remains, the worker exits voluntarily (elastic shrink). The
/// last worker never shrinks itself away while the pool is RUNNING, so
/// at least one worker exists while the pool can still receive work.
fn worker_loop(pool: Arc<Pool>) {
    loop {
        pool.idle_threads.fetch_add(1, Ordering::AcqRel);
        let item = pool.queue.dequeue(Timeout::After(pool.idle_timeout));
        pool.idle_threads.fetch_sub(1, Ordering::AcqRel);

        match item {
            Ok(work) => work(),
            Err(NiftyError::Shutdown) => break,
            Err(NiftyError::Timeout) => {
                if pool.queue.state() == QueueState::Running && pool.num_threads.load(Ordering::Acquire) > 1 {
                    break;
                }
                // Sole worker: keep waiting rather than leave the pool
                // with zero threads while still RUNNING.
            }
            Err(_) => break,
        }
    }
    pool.num_threads.fetch_sub(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    fn lookup_test_pool(backlog: usize, max_threads: usize) -> Arc<Pool> {
        let pool = Pool::new_with_idle_timeout(backlog, max_threads, 0, Duration::from_millis(50));
        let handle = nifty_core::create(pool);
        Pool::lookup(handle).unwrap()
    }

    #[test]
    fn create_raises_below_minimum_arguments() {
        let handle = Pool::create(0, 0, 0);
        let pool = Pool::lookup(handle).unwrap();
        assert_eq!(pool.max_threads, 1);
        pool.shutdown(Timeout::Infinite).unwrap();
    }

    #[test]
    fn submit_runs_work_on_a_spawned_worker() {
        let pool = lookup_test_pool(4, 2);
        let done = Arc::new(AtomicU32::new(0));
        let d = Arc::clone(&done);
        pool.submit(move || { d.fetch_add(1, Ordering::SeqCst); }, Timeout::Infinite).unwrap();
        for _ in 0..100 {
            if done.load(Ordering::SeqCst) == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(done.load(Ordering::SeqCst), 1);
        pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn submit_wait_returns_the_computed_result() {
        let pool = lookup_test_pool(4, 2);
        let result = pool.submit_wait(Timeout::After(Duration::from_secs(1)), || 6 * 7).unwrap();
        assert_eq!(result, 42);
        pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn pool_grows_up_to_max_threads_under_concurrent_load() {
        let pool = lookup_test_pool(8, 3);
        let barrier = Arc::new(std::sync::Barrier::new(3));
        let log = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let b = Arc::clone(&barrier);
            let l = Arc::clone(&log);
            pool.submit(
                move || {
                    b.wait();
                    l.lock().unwrap().push(());
                },
                Timeout::Infinite,
            )
            .unwrap();
        }
        for _ in 0..200 {
            if log.lock().unwrap().len() == 3 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(log.lock().unwrap().len(), 3);
        pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn idle_worker_shrinks_back_down_but_never_to_zero() {
        let pool = lookup_test_pool(8, 3);
        for _ in 0..3 {
            pool.submit(|| thread::sleep(Duration::from_millis(5)), Timeout::Infinite).unwrap();
        }
        thread::sleep(Duration::from_millis(400));
        assert!(pool.num_threads() >= 1);
        pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    }

    #[test]
    fn shutdown_still_runs_already_enqueued_items() {
        let pool = lookup_test_pool(8, 1);
        let done = Arc::new(AtomicU32::new(0));
        for _ in 0..5 {
            let d = Arc::clone(&done);
            pool.submit(move || { d.fetch_add(1, Ordering::SeqCst); }, Timeout::Infinite).unwrap();
        }
        pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn class_path_matches_both_pool_and_queue_prefixes() {
        assert!(nifty_core::prefix_matches(CLASS, "core:queue"));
        assert!(nifty_core::prefix_matches(CLASS, "core:queue:pool"));
        assert_eq!(CLASS, extend(nifty_queue::CLASS, "pool"));
    }
}
