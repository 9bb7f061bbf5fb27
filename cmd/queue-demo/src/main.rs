//! Queue demo
//!
//! Demonstrates backpressure on a bounded queue and shutdown-drain.

use nifty::{create, lookup_as, AnyObject, Queue, Timeout, QUEUE_CLASS};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    println!("=== Nifty Queue Demo ===\n");

    let handle = create(Queue::<u32>::new(2));
    let queue = lookup_as::<Queue<u32>>(handle, QUEUE_CLASS).expect("just created");

    println!("Capacity 2. Enqueuing 1, 2 (should not block)...");
    queue.enqueue(1, Timeout::Infinite).unwrap();
    queue.enqueue(2, Timeout::Infinite).unwrap();
    println!("count = {}", queue.count());

    let producer_queue = Arc::clone(&queue);
    let producer = thread::spawn(move || {
        println!("Producer: enqueuing 3 (queue is full, should block)...");
        producer_queue.enqueue(3, Timeout::Infinite).unwrap();
        println!("Producer: 3 enqueued after a consumer made room.");
    });

    thread::sleep(Duration::from_millis(100));
    println!("Consumer: dequeuing {}", queue.dequeue(Timeout::Infinite).unwrap());
    producer.join().unwrap();

    println!("\nDraining the remaining items, then shutting down...");
    while queue.count() > 0 {
        println!("Consumer: dequeued {}", queue.dequeue(Timeout::Infinite).unwrap());
    }
    queue.shutdown(Timeout::After(Duration::from_secs(1))).unwrap();
    println!("Queue state after shutdown: {:?}", queue.state());

    let any: Arc<dyn AnyObject> = queue;
    nifty::discard(&any); // undoes lookup_as's refcount bump
    nifty::discard(&any); // undoes create's initial refcount of 1
    println!("\n=== Demo Complete ===");
}
