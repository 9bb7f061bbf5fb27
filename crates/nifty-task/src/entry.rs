//! `Task` CoreObject
//!
//! Grounded on `gvthread-runtime/src/timer/entry.rs`'s `TimerEntry`
//! (deadline + optional periodicity + opaque payload), generalized from
//! a fixed `gvt_id: u32` payload to an arbitrary, type-erased
//! `(function, argument)` pair, matching the spec's `Task` fields.

use std::any::Any;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use nifty_core::{CoreObject, ObjectHeader};

pub const CLASS: &str = "core:task";

type Action = Box<dyn FnMut(&mut (dyn Any + Send)) + Send>;

struct Inner {
    abstime: Instant,
    interval: Duration,
    cancelled: bool,
    payload: Option<Box<dyn Any + Send>>,
    action: Option<Action>,
}

/// A scheduled unit of work. `interval == Duration::ZERO` means
/// one-shot (T-invariants as given: exactly one of heap / executing /
/// cancelled at any time, tracked by `heap_index`).
pub struct Task {
    header: ObjectHeader,
    /// Position in the scheduler's heap array, `-1` when not resident
    /// (either not yet inserted, currently executing, or removed).
    heap_index: AtomicIsize,
    /// Monotonically increasing insertion sequence, used to break ties
    /// among tasks with equal `abstime` (T2: FIFO tie-break).
    seq: u64,
    inner: Mutex<Inner>,
}

impl CoreObject for Task {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }
}

impl Task {
    pub(crate) fn new(seq: u64, abstime: Instant, interval: Duration, payload: Box<dyn Any + Send>, action: Action) -> Self {
        Task {
            header: ObjectHeader::new(CLASS),
            heap_index: AtomicIsize::new(-1),
            seq,
            inner: Mutex::new(Inner {
                abstime,
                interval,
                cancelled: false,
                payload: Some(payload),
                action: Some(action),
            }),
        }
    }

    #[inline]
    pub(crate) fn heap_index(&self) -> isize {
        self.heap_index.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_heap_index(&self, idx: isize) {
        self.heap_index.store(idx, Ordering::Relaxed);
    }

    /// `(abstime, insertion_seq)` ordering key for the heap comparator.
    pub(crate) fn order_key(&self) -> (Instant, u64) {
        (self.inner.lock().unwrap().abstime, self.seq)
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.inner.lock().unwrap().abstime
    }

    pub(crate) fn is_periodic(&self) -> bool {
        self.inner.lock().unwrap().interval > Duration::ZERO
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.lock().unwrap().cancelled
    }

    pub(crate) fn set_cancelled(&self) {
        self.inner.lock().unwrap().cancelled = true;
    }

    /// Advance `abstime` by `interval` for the next firing of a
    /// periodic task.
    pub(crate) fn reschedule(&self) {
        let mut inner = self.inner.lock().unwrap();
        let interval = inner.interval;
        inner.abstime += interval;
    }

    /// Run the task's action against its own payload. Must be called
    /// without holding the scheduler's heap lock (I4-style lock
    /// hygiene: the scheduler releases its lock before firing, exactly
    /// as the spec's algorithm describes).
    pub(crate) fn fire(&self) {
        let mut inner = self.inner.lock().unwrap();
        let Inner { action, payload, .. } = &mut *inner;
        if let (Some(action), Some(payload)) = (action.as_mut(), payload.as_mut()) {
            action(payload.as_mut());
        }
    }

    /// Take the argument out, downcasting to `A`. Used by `cancel` to
    /// hand the original argument back exactly once (T3); a type
    /// mismatch puts the payload back and returns `None`.
    pub(crate) fn take_argument<A: 'static>(&self) -> Option<A> {
        let mut inner = self.inner.lock().unwrap();
        let boxed = inner.payload.take()?;
        match boxed.downcast::<A>() {
            Ok(a) => Some(*a),
            Err(boxed) => {
                inner.payload = Some(boxed);
                None
            }
        }
    }
}
