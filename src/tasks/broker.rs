use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::store::{Result, TaskStore};
use super::types::{Task, TaskSpec};

/// TaskEnvelope carries one persisted task to a worker
#[derive(Clone, Debug)]
pub struct TaskEnvelope {
    pub task: Task,
}

/// TaskBroker hands submitted tasks to the worker pool
///
/// Architecture:
/// 1. API calls `broker.submit(spec)` after validating the site
/// 2. Broker persists the task in the TaskStore (atomic, fresh id)
/// 3. Broker sends a TaskEnvelope to a worker via mpsc channel
/// 4. Round-robin distribution across the pool
/// 5. Backpressure via bounded channels
///
/// The broker is not a separate task, just a struct with methods called by
/// API handlers. Submission returns as soon as the task is durably queued;
/// it never waits for execution.
pub struct TaskBroker {
    store: Arc<TaskStore>,
    worker_channels: Vec<mpsc::Sender<TaskEnvelope>>,
    next_worker: AtomicUsize,
}

impl TaskBroker {
    /// Create a new TaskBroker with worker channels
    ///
    /// Returns:
    /// - TaskBroker instance (to be passed to the API via Arc)
    /// - Vec of receivers (one per worker, for spawning workers)
    pub fn new(
        store: Arc<TaskStore>,
        num_workers: usize,
        channel_size: usize,
    ) -> (Self, Vec<mpsc::Receiver<TaskEnvelope>>) {
        info!(num_workers, channel_size, "Creating TaskBroker with worker channels");

        let mut worker_channels = Vec::with_capacity(num_workers);
        let mut worker_receivers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(channel_size);
            worker_channels.push(tx);
            worker_receivers.push(rx);
            debug!(worker_id, "Created worker channel");
        }

        let broker = Self {
            store,
            worker_channels,
            next_worker: AtomicUsize::new(0),
        };

        (broker, worker_receivers)
    }

    /// Submit a task: persist as queued, then distribute to a worker.
    ///
    /// Returns the queued task snapshot. A closed worker channel is not a
    /// submission failure; the task is already durable and will be visible
    /// in listings.
    pub async fn submit(&self, spec: TaskSpec) -> Result<Task> {
        let task = self.store.create(spec)?;

        debug!(id = task.id, site = %task.site, comicid = %task.comicid, "Task persisted");

        let envelope = TaskEnvelope { task: task.clone() };

        let worker_idx =
            self.next_worker.fetch_add(1, Ordering::Relaxed) % self.worker_channels.len();

        match self.worker_channels[worker_idx].send(envelope).await {
            Ok(_) => {
                debug!(id = task.id, worker_idx, "Task sent to worker");
            }
            Err(_) => {
                warn!(id = task.id, worker_idx, "Worker channel closed, task not delivered");
            }
        }

        Ok(task)
    }

    /// Get number of active workers
    pub fn num_workers(&self) -> usize {
        self.worker_channels.len()
    }

    /// Check if all worker channels are healthy (not closed)
    pub fn health_check(&self) -> bool {
        self.worker_channels.iter().all(|ch| !ch.is_closed())
    }
}
