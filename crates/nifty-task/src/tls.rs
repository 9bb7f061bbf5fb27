//! `task_this()`: the currently-firing task's handle, per thread
//!
//! Grounded on `gvthread-runtime/src/tls.rs`'s `CURRENT_WORKER_ID`
//! thread-local pattern, generalized from a worker index to a task
//! `Handle` set only while the scheduler thread is inside `Task::fire`.

use std::cell::Cell;

use nifty_core::Handle;

thread_local! {
    static CURRENT_TASK: Cell<Handle> = const { Cell::new(Handle::NONE) };
}

pub(crate) fn set_current(handle: Handle) {
    CURRENT_TASK.with(|cell| cell.set(handle));
}

pub(crate) fn clear_current() {
    CURRENT_TASK.with(|cell| cell.set(Handle::NONE));
}

/// `task_this() -> handle`: within a running task's function, returns
/// that task's own handle; `Handle::NONE` outside of one.
pub fn task_this() -> Handle {
    CURRENT_TASK.with(|cell| cell.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_none_outside_a_task() {
        assert_eq!(task_this(), Handle::NONE);
    }

    #[test]
    fn set_clear_roundtrip() {
        use nifty_core::{CoreObject, ObjectHeader};

        struct Probe {
            header: ObjectHeader,
        }
        impl CoreObject for Probe {
            fn header(&self) -> &ObjectHeader {
                &self.header
            }
        }

        let h = nifty_core::create(Probe {
            header: ObjectHeader::new("core:probe:tls-test"),
        });
        set_current(h);
        assert_eq!(task_this(), h);
        clear_current();
        assert_eq!(task_this(), Handle::NONE);

        let obj = nifty_core::lookup(h).unwrap();
        nifty_core::discard(&obj);
        nifty_core::discard(&obj);
    }
}
