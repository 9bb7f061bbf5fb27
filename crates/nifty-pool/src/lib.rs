//! # nifty-pool
//!
//! `Pool`: a dynamically-sized worker thread pool built atop
//! `nifty-queue::Queue`. Workers grow lazily under load, shrink back
//! when idle (never below one while the pool is running and has
//! pending work), and drain the backlog on shutdown before the last
//! worker exits.

#![allow(dead_code)]

pub mod pool;

pub use pool::{Pool, WorkItem, CLASS};
