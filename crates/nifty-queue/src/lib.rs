//! # nifty-queue
//!
//! Bounded, blocking FIFO `Queue` CoreObject with shutdown semantics.
//! The base abstraction `nifty-pool::Pool` builds its worker dispatch
//! on top of.

#![allow(dead_code)]

pub mod queue;

pub use queue::{Queue, QueueState, CLASS};
