//! Task orchestration: durable ledger, broker, and worker pool.
//!
//! Submission is fire-and-forget: the API persists a queued task through
//! the [`TaskBroker`] and returns immediately; execution happens on the
//! worker pool, which is the only mutator of a task after creation. Tasks
//! are never deleted here; a failed task stays recorded as failed.

pub mod broker;
pub mod delivery;
pub mod http;
pub mod store;
pub mod types;
pub mod worker;

pub use broker::{TaskBroker, TaskEnvelope};
pub use delivery::{DeliveryError, Mailer, PdfRenderer};
pub use http::{DownloadError, HttpConfig, PageDownloader};
pub use store::{StoreError, TaskStore};
pub use types::{ChapterSelector, Task, TaskSpec, TaskStatus};
pub use worker::{WorkerContext, WorkerError, spawn_workers};
