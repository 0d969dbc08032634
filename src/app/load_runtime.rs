//! Background image loads so decoding never stalls the frame loop.
//!
//! Requests go into a shared queue drained by at most one worker per core;
//! results come back over an unbounded channel in whatever order they
//! finish.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::core::gallery::{LoadOutcome, LoadRequest};
use crate::core::loader;

/// Decode one request and report it unless it was cancelled.
fn run_load(tx: &mpsc::UnboundedSender<LoadOutcome>, request: LoadRequest) {
    let LoadRequest {
        index,
        source,
        spec,
        token,
    } = request;
    if token.is_cancelled() {
        return;
    }
    let result = loader::load_or_placeholder(&source, spec, &token);
    // A cancelled load has nothing to report.
    if token.is_cancelled() {
        return;
    }
    let _ = tx.send(LoadOutcome {
        index,
        token,
        result,
    });
}

/// Drain `jobs` with at most `max_workers` threads.  Returns how many
/// workers were started.
fn run_pool<T, F>(jobs: Vec<T>, max_workers: usize, job: F) -> usize
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let job_count = jobs.len();
    if job_count == 0 {
        return 0;
    }
    let worker_count = max_workers.max(1).min(job_count);
    let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
    let job = Arc::new(job);

    for _ in 0..worker_count {
        let queue = Arc::clone(&queue);
        let job = Arc::clone(&job);
        std::thread::spawn(move || loop {
            let next = match queue.lock() {
                Ok(mut q) => q.pop_front(),
                Err(_) => break,
            };
            match next {
                Some(item) => job(item),
                None => break,
            }
        });
    }
    worker_count
}

/// Queue every request on a pool sized to the machine.  Returns how many
/// workers were started.
pub fn spawn_all(tx: &mpsc::UnboundedSender<LoadOutcome>, requests: Vec<LoadRequest>) -> usize {
    let max_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    for request in &requests {
        tracing::trace!(index = request.index, source = %request.source, "queueing load");
    }
    let tx = tx.clone();
    run_pool(requests, max_workers, move |request| run_load(&tx, request))
}
