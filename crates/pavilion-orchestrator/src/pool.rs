// crates/pavilion-orchestrator/src/pool.rs
// ============================================================================
// Module: Bounded Worker Pool
// Description: A fixed-size thread pool executing resolution, build
//              coordination, and dispatch work items independently.
// Purpose: Give the orchestrator the "multi-process, parallel within one
//          Pavilion invocation" concurrency model of §5 without pulling in
//          an async runtime the rest of the workspace does not use.
// Dependencies: std::thread, std::sync::mpsc
// ============================================================================

//! ## Overview
//! Work items are run-level (§4.7): resolving one test, coalescing/building
//! one hash, and dispatching one job are each independent closures submitted
//! to [`WorkerPool::submit`]. Dropping the pool closes the job channel and
//! joins every worker, so outstanding work always finishes before the pool
//! itself is torn down.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads consuming closures from a shared
/// queue.
pub struct WorkerPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` worker threads. `size` is clamped to at least 1.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0 .. size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("pavilion-worker-{index}"))
                    .spawn(move || {
                        loop {
                            let job = {
                                let guard = receiver.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                                guard.recv()
                            };
                            match job {
                                Ok(job) => job(),
                                Err(_) => break,
                            }
                        }
                    })
            })
            .collect::<Result<Vec<_>, std::io::Error>>()
            .unwrap_or_else(|err| unreachable!("OS refused to spawn a pavilion worker thread: {err}"));

        Self { sender: Some(sender), workers }
    }

    /// Queues a work item for execution on the next free worker.
    ///
    /// The pool is only ever torn down by [`Drop`], which requires no
    /// outstanding `&self` borrow, so a live `&self` guarantees the channel
    /// is still open; both branches below are therefore unreachable outside
    /// of a caller bug.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        let Some(sender) = self.sender.as_ref() else {
            unreachable!("worker pool sender missing before drop");
        };
        if sender.send(Box::new(job)).is_err() {
            unreachable!("worker pool receiver dropped while still accepting work");
        }
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[test]
    fn every_submitted_job_runs_exactly_once() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0 .. 50 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        drop(pool);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn pool_size_is_clamped_to_at_least_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.size(), 1);
    }
}
