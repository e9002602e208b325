//! Event dispatcher.
//!
//! Filters decoded webhook events and submits one job per accepted event to
//! the worker pool. Submission waits while the pool queue is full.

use std::sync::Arc;

use stash_core::{AllowList, EventOrigin, WebhookEvent};
use stash_worker::JobSender;

use super::jobs::{event_job, JobContext};

pub struct Dispatcher {
    allowed_users: AllowList,
    jobs: JobSender,
    ctx: Arc<JobContext>,
}

impl Dispatcher {
    pub fn new(allowed_users: AllowList, jobs: JobSender, ctx: JobContext) -> Self {
        if allowed_users.is_empty() {
            tracing::warn!("Allow list is empty, every event will be dropped");
        }
        Self {
            allowed_users,
            jobs,
            ctx: Arc::new(ctx),
        }
    }

    /// Whether `event` should become a job.
    ///
    /// Only message events from a 1:1 chat with an allow-listed user
    /// qualify. Group and room events are dropped even for listed users.
    pub fn accepts(&self, event: &WebhookEvent) -> bool {
        let EventOrigin::User { user_id } = &event.origin else {
            return false;
        };
        event.message().is_some() && self.allowed_users.contains(user_id)
    }

    /// Submit a job for every accepted event, in delivery order.
    ///
    /// Returns the number of jobs submitted.
    pub async fn dispatch(&self, events: Vec<WebhookEvent>) -> usize {
        let mut submitted = 0;
        for event in events {
            if !self.accepts(&event) {
                tracing::debug!(
                    origin = event.origin.label(),
                    user_id = event.user_id().unwrap_or("-"),
                    "Dropping event"
                );
                continue;
            }

            let job = event_job(Arc::clone(&self.ctx), event);
            let label = job.label().to_string();
            match self.jobs.submit(job).await {
                Ok(()) => submitted += 1,
                Err(e) => tracing::error!(job = %label, error = %e, "Job submission failed"),
            }
        }
        submitted
    }
}
