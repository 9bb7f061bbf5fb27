//! # nifty-task
//!
//! A single-threaded min-heap task scheduler: `schedule_in` enqueues a
//! one-shot or periodic unit of work and returns a handle; `cancel`
//! pulls it back out before it fires, returning the original argument.
//! One background thread owns the heap and runs every task's action in
//! turn, grounded on the teacher's `timer/impls/heap.rs` poll loop.

#![allow(dead_code)]

mod entry;
mod heap;
mod scheduler;
mod tls;

pub use entry::CLASS;
pub use scheduler::{cancel, schedule_in};
pub use tls::task_this;
