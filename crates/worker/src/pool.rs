//! Fixed-size worker pool over a bounded FIFO queue.
//!
//! ```text
//!  submit ──► [ bounded mpsc queue (capacity N) ] ──► worker 0 ─┐
//!  submit ──►                                    ──► worker 1  ├─ run job, log failure
//!                                                ──► worker W ─┘
//! ```
//!
//! The single receiver is shared by the workers behind an async mutex that
//! is held only while waiting for the next job. Closing cancels a token; the
//! worker holding the receiver then closes it, so every worker drains what is
//! left and exits once `recv` yields `None`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::job::{Job, JobError, JobResult, JobTicket};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Pool construction failures. Treat as fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    /// Workers are tokio tasks and need a runtime to live on.
    #[error("no tokio runtime available to host workers")]
    NoRuntime,
}

/// Submission failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// The pool has been closed; the job was dropped without running.
    #[error("worker pool is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Point-in-time job counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted into the queue.
    pub submitted: u64,
    /// Jobs that returned `Ok`.
    pub succeeded: u64,
    /// Jobs that returned `Err` or panicked.
    pub failed: u64,
    /// Subset of `failed` that panicked.
    pub panicked: u64,
    /// Jobs executing at the time of the snapshot.
    pub running: usize,
}

impl PoolStats {
    /// Jobs that have finished, successfully or not.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    running: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            panicked: self.panicked.load(Ordering::Acquire),
            running: self.running.load(Ordering::Acquire),
        }
    }
}

// ---------------------------------------------------------------------------
// JobSender
// ---------------------------------------------------------------------------

/// Cloneable handle for submitting jobs to a [`WorkerPool`].
///
/// Holding a sender does not keep the pool open: once
/// [`WorkerPool::close`] runs, every sender starts returning
/// [`SubmitError::Closed`].
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
    counters: Arc<Counters>,
}

impl JobSender {
    /// Enqueue a job, waiting for space if the queue is full.
    ///
    /// There is no timeout: a saturated pool slows the caller down instead
    /// of shedding work. The job's outcome is not reported back.
    ///
    /// Cancel-safe: dropping the future while it waits for space leaves the
    /// queue and the counters untouched.
    pub async fn submit(&self, job: Job) -> Result<(), SubmitError> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| SubmitError::Closed)?;
        // Count before the job becomes visible so `submitted >= completed`
        // holds in every snapshot.
        self.counters.submitted.fetch_add(1, Ordering::AcqRel);
        permit.send(job);
        Ok(())
    }

    /// Like [`submit`](Self::submit), but returns a ticket that resolves to
    /// the job's outcome once a worker has run it.
    pub async fn submit_tracked(&self, mut job: Job) -> Result<JobTicket, SubmitError> {
        let ticket = job.track();
        self.submit(job).await?;
        Ok(ticket)
    }

    /// Jobs currently waiting in the queue.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// A fixed set of workers consuming a bounded FIFO job queue.
///
/// At most `worker_count` jobs run at once. Jobs are dequeued in submission
/// order but may finish in any order. A failing or panicking job is logged
/// and counted; it never takes its worker down.
///
/// Created once at startup and closed once at shutdown. [`close`](Self::close)
/// consumes the pool, so it cannot be closed twice.
#[derive(Debug)]
pub struct WorkerPool {
    sender: JobSender,
    closing: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    /// Allocate a queue of `queue_capacity` and start `worker_count` workers
    /// on the current tokio runtime. Does not block.
    pub fn new(queue_capacity: usize, worker_count: usize) -> Result<Self, PoolError> {
        if queue_capacity == 0 {
            return Err(PoolError::ZeroCapacity);
        }
        if worker_count == 0 {
            return Err(PoolError::ZeroWorkers);
        }
        // Checked before allocating anything so a failure starts no worker.
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let closing = CancellationToken::new();
        let counters = Arc::new(Counters::default());

        let workers = (0..worker_count)
            .map(|worker_id| {
                runtime.spawn(worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    closing.clone(),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        tracing::info!(queue_capacity, worker_count, "Worker pool started");

        Ok(Self {
            sender: JobSender { tx, counters },
            closing,
            workers,
            queue_capacity,
        })
    }

    /// Enqueue a job. See [`JobSender::submit`].
    pub async fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.sender.submit(job).await
    }

    /// Enqueue a job and get a ticket for its outcome. See
    /// [`JobSender::submit_tracked`].
    pub async fn submit_tracked(&self, job: Job) -> Result<JobTicket, SubmitError> {
        self.sender.submit_tracked(job).await
    }

    /// A cloneable submission handle.
    pub fn submitter(&self) -> JobSender {
        self.sender.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn stats(&self) -> PoolStats {
        self.sender.counters.snapshot()
    }

    /// Stop accepting jobs, run everything already queued, and wait for
    /// every worker to exit.
    ///
    /// Call after the last submission. Once this returns no job is running
    /// and none will start.
    pub async fn close(self) -> PoolStats {
        let Self {
            sender,
            closing,
            workers,
            ..
        } = self;

        tracing::info!(
            queued = sender.queued(),
            "Closing worker pool, draining queued jobs"
        );
        closing.cancel();

        for (worker_id, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!(worker_id, error = %e, "Worker task ended abnormally");
            }
        }

        let stats = sender.counters.snapshot();
        tracing::info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            panicked = stats.panicked,
            "Worker pool closed"
        );
        stats
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    closing: CancellationToken,
    counters: Arc<Counters>,
) {
    tracing::debug!(worker_id, "Worker started");

    while let Some(job) = next_job(&queue, &closing).await {
        run_job(worker_id, job, &counters).await;
    }

    tracing::debug!(worker_id, "Queue closed and drained, worker exiting");
}

/// Wait for the next job; `None` once the queue is closed and empty.
async fn next_job(
    queue: &Mutex<mpsc::Receiver<Job>>,
    closing: &CancellationToken,
) -> Option<Job> {
    let mut rx = queue.lock().await;
    tokio::select! {
        biased;
        job = rx.recv() => job,
        () = closing.cancelled() => {
            // Buffered jobs are still delivered after close.
            rx.close();
            rx.recv().await
        }
    }
}

async fn run_job(worker_id: usize, job: Job, counters: &Counters) {
    let (label, run, outcome_tx) = job.into_parts();
    let label = label.as_deref().unwrap_or("job");

    counters.running.fetch_add(1, Ordering::AcqRel);
    let caught = AssertUnwindSafe(async move { run().await })
        .catch_unwind()
        .await;
    counters.running.fetch_sub(1, Ordering::AcqRel);

    let result: JobResult = match caught {
        Ok(Ok(())) => {
            counters.succeeded.fetch_add(1, Ordering::AcqRel);
            tracing::debug!(worker_id, job = label, "Job completed");
            Ok(())
        }
        Ok(Err(err)) => {
            counters.failed.fetch_add(1, Ordering::AcqRel);
            tracing::warn!(worker_id, job = label, error = %err, "Job failed");
            Err(err)
        }
        Err(payload) => {
            counters.failed.fetch_add(1, Ordering::AcqRel);
            counters.panicked.fetch_add(1, Ordering::AcqRel);
            let message = panic_message(payload.as_ref());
            tracing::error!(worker_id, job = label, panic = %message, "Job panicked");
            Err(JobError::new(format!("job panicked: {message}")))
        }
    };

    if let Some(tx) = outcome_tx {
        // The ticket holder may have stopped waiting.
        let _ = tx.send(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
