//! The unit of work accepted by the pool.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

/// Outcome of a job: success, or a failure carrying a reason.
pub type JobResult = Result<(), JobError>;

/// Why a job failed. Logged by the pool, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct JobError {
    reason: String,
}

impl JobError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<String> for JobError {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

impl From<&str> for JobError {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

type RunFn = Box<dyn FnOnce() -> BoxFuture<'static, JobResult> + Send>;

/// A deferred, self-contained unit of work.
///
/// The closure owns everything it needs; once submitted the job belongs to
/// the pool and runs at most once.
pub struct Job {
    label: Option<String>,
    run: RunFn,
    outcome_tx: Option<oneshot::Sender<JobResult>>,
}

impl Job {
    /// Wrap an async closure as a job.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = JobResult> + Send + 'static,
    {
        Self {
            label: None,
            run: Box::new(move || f().boxed()),
            outcome_tx: None,
        }
    }

    /// Attach a label used in log lines about this job.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The label, or `"job"` when none was set.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("job")
    }

    pub(crate) fn track(&mut self) -> JobTicket {
        let (tx, rx) = oneshot::channel();
        self.outcome_tx = Some(tx);
        JobTicket { rx }
    }

    pub(crate) fn into_parts(self) -> (Option<String>, RunFn, Option<oneshot::Sender<JobResult>>) {
        (self.label, self.run, self.outcome_tx)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("label", &self.label())
            .field("tracked", &self.outcome_tx.is_some())
            .finish_non_exhaustive()
    }
}

/// Receipt for a job submitted with
/// [`submit_tracked`](crate::JobSender::submit_tracked).
#[derive(Debug)]
pub struct JobTicket {
    rx: oneshot::Receiver<JobResult>,
}

impl JobTicket {
    /// Wait for the job to finish and return its outcome.
    ///
    /// Returns `None` if the job was dropped without running, which only
    /// happens when the runtime hosting the workers shuts down.
    pub async fn outcome(self) -> Option<JobResult> {
        self.rx.await.ok()
    }
}
