//! Bounded concurrent job pool.
//!
//! - [`Job`] is a deferred unit of work resolving to a [`JobResult`].
//! - [`WorkerPool`] runs jobs on a fixed number of tokio tasks fed from a
//!   bounded FIFO queue. Submitting to a full queue waits for space.
//! - [`JobSender`] is a cloneable submission handle for request handlers.
//!
//! # Lifecycle
//!
//! ```rust
//! use stash_worker::{Job, WorkerPool};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pool = WorkerPool::new(16, 4).expect("pool starts inside a runtime");
//!
//! pool.submit(Job::new(|| async { Ok(()) }).with_label("hello"))
//!     .await
//!     .expect("pool is open");
//!
//! // Waits for every queued and running job, then for every worker.
//! let stats = pool.close().await;
//! assert_eq!(stats.succeeded, 1);
//! # }
//! ```

pub mod job;
pub mod pool;

pub use job::{Job, JobError, JobResult, JobTicket};
pub use pool::{JobSender, PoolError, PoolStats, SubmitError, WorkerPool};
