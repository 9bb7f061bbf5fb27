//! The process-wide task scheduler
//!
//! A single background thread owns one `TaskHeap` and wakes on whichever
//! comes first: the earliest pending deadline, or a fresh `schedule`/
//! `cancel` call disturbing that deadline. Grounded on the teacher's
//! `timer/impls/heap.rs` poll loop (condvar-gated wait against the
//! heap's minimum, pop-while-due, run outside the lock), adapted from a
//! fixed poll tick to an exact `wait_timeout` against the next deadline.
//!
//! Unlike `Queue`/`Pool`, the scheduler itself is not a `CoreObject` —
//! the public surface never hands out a scheduler handle, only task
//! handles (`schedule` returns one, `cancel` takes one), so there is
//! nothing here for a caller to `create`/`lookup`/`discard`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use nifty_core::{AnyObject, CoreObject, Handle};

use crate::entry::{Task, CLASS};
use crate::heap::TaskHeap;
use crate::tls;

struct Inner {
    heap: TaskHeap,
    /// Mirrors which tasks are reachable by handle outside the heap
    /// array itself (periodic tasks between firings stay in both; a
    /// currently-executing task is only here).
    by_handle: HashMap<Handle, Arc<Task>>,
}

struct Scheduler {
    inner: Mutex<Inner>,
    /// Woken whenever the earliest deadline could have changed: a fresh
    /// schedule, a cancel, or a task finishing its run.
    wakeup: Condvar,
    next_seq: AtomicU64,
}

fn scheduler() -> Arc<Scheduler> {
    static INSTANCE: OnceLock<Arc<Scheduler>> = OnceLock::new();
    INSTANCE
        .get_or_init(|| {
            let sched = Arc::new(Scheduler {
                inner: Mutex::new(Inner {
                    heap: TaskHeap::new(),
                    by_handle: HashMap::new(),
                }),
                wakeup: Condvar::new(),
                next_seq: AtomicU64::new(0),
            });
            let background = Arc::clone(&sched);
            thread::Builder::new()
                .name("nifty-task-scheduler".to_string())
                .spawn(move || run(background))
                .expect("failed to spawn the task scheduler thread");
            sched
        })
        .clone()
}

/// `schedule(abstime, interval, fn, arg) -> handle`. `abstime` is given
/// as a delay from now; `interval == Duration::ZERO` means one-shot.
pub fn schedule_in<A, F>(delay: Duration, interval: Duration, argument: A, function: F) -> Handle
where
    A: Send + 'static,
    F: FnMut(&mut (dyn std::any::Any + Send)) + Send + 'static,
{
    let sched = scheduler();
    let seq = sched.next_seq.fetch_add(1, Ordering::Relaxed);
    let task = Task::new(seq, Instant::now() + delay, interval, Box::new(argument), Box::new(function));
    let raw_handle = nifty_core::create(task);
    // One lookup gives the scheduler its own long-lived `Arc<Task>` to
    // hold in the heap and the side map; its refcount bump is undone
    // exactly once, alongside `create`'s baseline, when the task's
    // handle stops being reachable (see `retire`).
    let task = nifty_core::lookup_as::<Task>(raw_handle, CLASS).expect("just created");

    let mut guard = sched.inner.lock().unwrap();
    guard.heap.push(Arc::clone(&task));
    guard.by_handle.insert(raw_handle, task);
    drop(guard);
    sched.wakeup.notify_one();
    raw_handle
}

/// `cancel(handle) -> arg | NULL`. Returns the task's original argument
/// if it was still pending in the heap; `None` if it is currently
/// executing (marked cancelled so a periodic task does not reschedule)
/// or the handle names no live task.
pub fn cancel<A: Send + 'static>(handle: Handle) -> Option<A> {
    let sched = scheduler();
    let mut guard = sched.inner.lock().unwrap();
    let task = guard.by_handle.get(&handle).cloned()?;
    if guard.heap.remove(&task) {
        guard.by_handle.remove(&handle);
        drop(guard);
        retire(&task);
        task.take_argument::<A>()
    } else {
        // Either currently executing, or already removed by a prior
        // cancel/one-shot completion racing this call.
        task.set_cancelled();
        None
    }
}

/// Undo the two refcount increments `schedule_in` accrued (`create`'s
/// baseline plus the scheduler's own `lookup_as`), releasing the task
/// from the process-wide handle table.
fn retire(task: &Arc<Task>) {
    let any: Arc<dyn AnyObject> = task.clone() as Arc<dyn AnyObject>;
    nifty_core::discard(&any);
    nifty_core::discard(&any);
}

fn run(sched: Arc<Scheduler>) {
    loop {
        let mut guard = sched.inner.lock().unwrap();
        loop {
            match guard.heap.peek_deadline() {
                None => guard = sched.wakeup.wait(guard).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if deadline <= now {
                        break;
                    }
                    let (g, _timed_out) = sched.wakeup.wait_timeout(guard, deadline - now).unwrap();
                    guard = g;
                }
            }
        }

        let mut due = Vec::new();
        while let Some(deadline) = guard.heap.peek_deadline() {
            if deadline > Instant::now() {
                break;
            }
            due.push(guard.heap.pop_min().expect("just peeked"));
        }
        drop(guard);

        for task in due {
            tls::set_current(task.handle());
            task.fire();
            tls::clear_current();

            if task.is_periodic() && !task.is_cancelled() {
                task.reschedule();
                sched.inner.lock().unwrap().heap.push(Arc::clone(&task));
            } else {
                let mut guard = sched.inner.lock().unwrap();
                guard.by_handle.remove(&task.handle());
                drop(guard);
                retire(&task);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn one_shot_task_fires_once_with_its_argument() {
        let (tx, rx) = mpsc::channel::<u32>();
        schedule_in(Duration::from_millis(5), Duration::ZERO, tx, move |payload| {
            let tx = payload.downcast_mut::<mpsc::Sender<u32>>().unwrap();
            tx.send(42).unwrap();
        });
        let got = rx.recv_timeout(Duration::from_secs(2)).expect("task should fire");
        assert_eq!(got, 42);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err(), "must not fire twice");
    }

    #[test]
    fn periodic_task_fires_more_than_once() {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = schedule_in(Duration::from_millis(5), Duration::from_millis(5), tx, move |payload| {
            let tx = payload.downcast_mut::<mpsc::Sender<()>>().unwrap();
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let leftover: Option<mpsc::Sender<()>> = cancel(handle);
        assert!(leftover.is_none() || leftover.is_some());
    }

    #[test]
    fn cancel_before_firing_returns_the_original_argument() {
        let handle = schedule_in(Duration::from_secs(60), Duration::ZERO, 7u32, |_| {});
        let arg: Option<u32> = cancel(handle);
        assert_eq!(arg, Some(7));
    }

    #[test]
    fn cancel_of_unknown_handle_returns_none() {
        let arg: Option<u32> = cancel(Handle::NONE);
        assert_eq!(arg, None);
    }

    #[test]
    fn task_this_reports_its_own_handle_while_firing() {
        let (tx, rx) = mpsc::channel::<Handle>();
        schedule_in(Duration::from_millis(5), Duration::ZERO, tx, move |payload| {
            let tx = payload.downcast_mut::<mpsc::Sender<Handle>>().unwrap();
            let _ = tx.send(tls::task_this());
        });
        let seen = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(seen.is_some());
    }
}
