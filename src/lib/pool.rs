//! Bounded worker pool with ordered, all-or-nothing results.
//!
//! [`WorkerPool::run_all`] submits a batch of independent tasks, blocks until every task has
//! returned (the phase barrier) and hands back results in submission order. The first failure
//! stops tasks that have not started yet; tasks already running are left to finish since
//! external commands cannot be cancelled safely.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::unbounded;
use log::debug;

use crate::errors::{Result, TrimError};
use crate::reorder_buffer::ReorderBuffer;

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Creates a pool with exactly `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn the threads.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fqtrim-worker-{i}"))
            .build()
            .map_err(|e| TrimError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: format!("failed to build a pool of {threads} threads: {e}"),
            })?;
        Ok(Self { pool, threads })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `task` over every input and waits for all of them.
    ///
    /// `task` receives the submission index and the input. On success the outputs are returned
    /// in submission order, whatever order the tasks completed in. If any task fails, the
    /// error from the lowest failing index is returned and no outputs are.
    ///
    /// # Errors
    ///
    /// Returns the first (by submission index) error produced by `task`.
    pub fn run_all<I, T, F>(&self, inputs: Vec<I>, task: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(usize, I) -> Result<T> + Sync,
    {
        let total = inputs.len();
        let (tx, rx) = unbounded::<(usize, Option<Result<T>>)>();
        let abort = AtomicBool::new(false);

        self.pool.scope_fifo(|scope| {
            for (index, input) in inputs.into_iter().enumerate() {
                let tx = tx.clone();
                let task = &task;
                let abort = &abort;
                scope.spawn_fifo(move |_| {
                    let outcome = if abort.load(Ordering::Acquire) {
                        None
                    } else {
                        let result = task(index, input);
                        if result.is_err() {
                            abort.store(true, Ordering::Release);
                        }
                        Some(result)
                    };
                    // The receiver outlives the scope, so sending cannot fail.
                    let _ = tx.send((index, outcome));
                });
            }
        });
        drop(tx);

        let mut buffer = ReorderBuffer::new();
        let mut outputs = Vec::with_capacity(total);
        let mut failure: Option<(usize, TrimError)> = None;
        let mut skipped = 0usize;

        for (index, outcome) in rx {
            match outcome {
                Some(Ok(value)) => buffer.insert(index, value),
                Some(Err(e)) => {
                    if failure.as_ref().is_none_or(|(first, _)| index < *first) {
                        failure = Some((index, e));
                    }
                }
                None => skipped += 1,
            }
        }

        if let Some((index, e)) = failure {
            debug!("Task {index} failed; {skipped} queued task(s) were not started");
            return Err(e);
        }

        outputs.extend(buffer.drain_ready());
        debug_assert_eq!(outputs.len(), total, "Every task must produce a result");
        Ok(outputs)
    }
}
