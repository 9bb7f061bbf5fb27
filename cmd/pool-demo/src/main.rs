//! Pool demo
//!
//! Demonstrates a dynamically-sized worker pool growing under
//! concurrent load and shrinking back once idle.

use nifty::{Pool, Timeout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== Nifty Pool Demo ===\n");

    let handle = Pool::create(/* backlog_limit */ 32, /* max_threads */ 4, /* stack_size */ 0);
    let pool = Pool::lookup(handle).expect("just created");

    let completed = Arc::new(AtomicUsize::new(0));
    let total_jobs = 8;

    println!("Submitting {} jobs to a pool capped at 4 workers...\n", total_jobs);
    for i in 0..total_jobs {
        let completed = Arc::clone(&completed);
        pool.submit(
            move || {
                println!("[job {}] running on a worker thread", i);
                thread::sleep(Duration::from_millis(50));
                completed.fetch_add(1, Ordering::SeqCst);
            },
            Timeout::Infinite,
        )
        .unwrap();
    }

    while completed.load(Ordering::SeqCst) < total_jobs {
        thread::sleep(Duration::from_millis(10));
    }
    println!("\nAll {} jobs completed. Peak worker count observed: {}", total_jobs, pool.num_threads());

    let answer = pool.submit_wait(Timeout::After(Duration::from_secs(1)), || 6 * 7).unwrap();
    println!("submit_wait result: {}", answer);

    println!("\nWaiting for idle workers to shrink back down...");
    thread::sleep(Duration::from_millis(200));
    println!("Worker count after idling: {}", pool.num_threads());

    pool.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    println!("\n=== Demo Complete ===");
}
