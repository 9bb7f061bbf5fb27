//! Cross-component stress test
//!
//! Drives `Queue`, `Pool`, and the task scheduler together: a periodic
//! task feeds a pool's backlog, workers report results through a
//! shared `Queue`, and a final tally is read back off of it.

use nifty::{cancel, create, discard, lookup_as, schedule_in, AnyObject, Pool, Queue, Timeout, QUEUE_CLASS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() {
    println!("=== Nifty Stress Test ===\n");

    let num_jobs: u64 = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(2_000);

    let results_handle = create(Queue::<u64>::new(0));
    let results: Arc<Queue<u64>> = lookup_as(results_handle, QUEUE_CLASS).expect("just created");

    let pool_handle = Pool::create(256, 8, 0);
    let pool = Pool::lookup(pool_handle).expect("just created");

    println!("Submitting {} jobs across up to 8 workers...", num_jobs);
    let start = Instant::now();
    for i in 0..num_jobs {
        let results = Arc::clone(&results);
        pool.submit(
            move || {
                let _ = results.enqueue(i, Timeout::Infinite);
            },
            Timeout::Infinite,
        )
        .unwrap();
    }

    let mut received: u64 = 0;
    let mut checksum: u64 = 0;
    while received < num_jobs {
        if let Ok(v) = results.dequeue(Timeout::After(Duration::from_secs(5))) {
            checksum = checksum.wrapping_add(v);
            received += 1;
        } else {
            println!("Timed out waiting for results; received {}/{}", received, num_jobs);
            break;
        }
    }
    let elapsed = start.elapsed();
    println!("\nReceived {} results in {:?} ({:.0} jobs/sec)", received, elapsed, num_jobs as f64 / elapsed.as_secs_f64());
    println!("Checksum: {}", checksum);

    println!("\nLayering a periodic task on top that submits pool work every 20ms...");
    let submitted = Arc::new(AtomicU64::new(0));
    let task_pool = Arc::clone(&pool);
    let counter = Arc::clone(&submitted);
    let handle = schedule_in(Duration::from_millis(20), Duration::from_millis(20), (), move |_| {
        let counter = Arc::clone(&counter);
        let _ = task_pool.submit(move || { counter.fetch_add(1, Ordering::SeqCst); }, Timeout::Poll);
    });
    std::thread::sleep(Duration::from_millis(220));
    let _: Option<()> = cancel(handle);
    println!("Periodic task submitted {} pool jobs before cancellation.", submitted.load(Ordering::SeqCst));

    pool.shutdown(Timeout::After(Duration::from_secs(2))).unwrap();

    let any: Arc<dyn AnyObject> = results;
    discard(&any);
    discard(&any);

    println!("\n=== Stress Test Complete ===");
}
