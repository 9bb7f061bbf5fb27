//! Task scheduler demo
//!
//! Demonstrates a one-shot task, a periodic task, cancellation, and
//! `task_this()` from within a running task.

use nifty::{cancel, schedule_in, task_this};
use std::sync::mpsc;
use std::time::Duration;

fn main() {
    println!("=== Nifty Task Scheduler Demo ===\n");

    println!("Scheduling a one-shot task, 200ms from now...");
    let (tx, rx) = mpsc::channel::<&'static str>();
    schedule_in(Duration::from_millis(200), Duration::ZERO, tx, move |payload| {
        let tx = payload.downcast_mut::<mpsc::Sender<&'static str>>().unwrap();
        println!("[one-shot] firing; task_this() = {}", task_this());
        let _ = tx.send("done");
    });
    println!("One-shot result: {:?}\n", rx.recv_timeout(Duration::from_secs(2)));

    println!("Scheduling a periodic task every 100ms...");
    let (tick_tx, tick_rx) = mpsc::channel();
    let periodic = schedule_in(Duration::from_millis(100), Duration::from_millis(100), 0u32, move |payload| {
        let count = payload.downcast_mut::<u32>().unwrap();
        *count += 1;
        println!("[periodic] tick {}", count);
        let _ = tick_tx.send(*count);
    });
    for _ in 0..3 {
        tick_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }

    println!("\nCancelling the periodic task...");
    let leftover: Option<u32> = cancel(periodic);
    println!("Cancelled with leftover argument: {:?}", leftover);

    println!("\nScheduling a task we cancel before it ever fires...");
    let premature = schedule_in(Duration::from_secs(60), Duration::ZERO, "never runs", |_| {});
    let arg: Option<&str> = cancel(premature);
    println!("Cancel-before-firing returned: {:?}", arg);

    println!("\n=== Demo Complete ===");
}
