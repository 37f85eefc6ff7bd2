//! Shared harness for the scenario tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;

use interlock::Governor;

/// Initialize tracing for tests if not already done.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Runs one governed round: `threads` workers subscribe under ids
/// `0..threads`, pass `points` control points each, then unsubscribe.
///
/// Returns the order in which control points were granted. Exactly one
/// worker runs at a time, so the log order is the dispatch order.
pub fn run_workers(governor: &Arc<Governor>, threads: usize, points: usize) -> Vec<usize> {
    governor.prepare(threads);
    let order = Arc::new(Mutex::new(Vec::with_capacity(threads * points)));

    let handles: Vec<_> = (0..threads)
        .map(|id| {
            let governor = Arc::clone(governor);
            let order = Arc::clone(&order);
            thread::spawn(move || {
                governor.subscribe(id).expect("fresh id in a fresh round");
                for _ in 0..points {
                    governor.control_point();
                    order.lock().unwrap().push(id);
                }
                governor.unsubscribe();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker completes its round");
    }

    let order = order.lock().unwrap().clone();
    order
}
