//! Bounded fan-out for independent sub-model tasks.

use std::panic;
use std::thread;

use tracing::debug;

/// Run independent tasks on scoped threads, at most `max_parallel` at a
/// time, and return their results in submission order.
///
/// `max_parallel <= 1` runs everything on the calling thread. Tasks must
/// not share mutable state; each owns whatever it captures. A panicking
/// task panics the caller.
pub fn run_batched<R, F>(tasks: Vec<F>, max_parallel: usize) -> Vec<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    if tasks.is_empty() {
        return Vec::new();
    }
    if max_parallel <= 1 {
        return tasks.into_iter().map(|task| task()).collect();
    }

    debug!(count = tasks.len(), max_parallel, "dispatching tasks");
    let mut pending = tasks.into_iter();
    let mut results = Vec::new();
    loop {
        let batch: Vec<F> = pending.by_ref().take(max_parallel).collect();
        if batch.is_empty() {
            break;
        }
        let outcomes = thread::scope(|s| {
            let handles: Vec<_> = batch.into_iter().map(|task| s.spawn(task)).collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect::<Vec<R>>()
        });
        results.extend(outcomes);
    }
    results
}
