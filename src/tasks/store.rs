use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

use super::types::{Task, TaskSpec, TaskStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task not found: id={0}")]
    TaskNotFound(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// TaskStore is the durable task ledger, backed by Fjall.
///
/// Architecture:
/// - `tasks` partition: u64 id (big-endian) → Task (JSON)
/// - `metadata` partition: "next_id" → u64 (persisted counter)
///
/// Ids are issued from an in-memory atomic counter recovered from the
/// metadata partition at open, so they stay monotonic and duplicate-free
/// across concurrent submissions and process restarts. Big-endian keys make
/// the partition iterate in id order; listings walk it in reverse for
/// most-recent-first pages.
pub struct TaskStore {
    keyspace: Keyspace,
    tasks: PartitionHandle,
    metadata: PartitionHandle,
    id_counter: Arc<AtomicU64>,
}

impl TaskStore {
    /// Open or create a TaskStore at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening TaskStore at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let tasks = keyspace.open_partition("tasks", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        // Recover the id counter; ids start at 1
        let next_id = metadata
            .get(b"next_id")?
            .map(|bytes| u64::from_be_bytes(bytes.as_ref().try_into().unwrap_or([0u8; 8])))
            .unwrap_or(1)
            .max(1);

        info!("TaskStore opened, next task id: {}", next_id);

        Ok(Self {
            keyspace,
            tasks,
            metadata,
            id_counter: Arc::new(AtomicU64::new(next_id)),
        })
    }

    /// Create a new queued task from a submission and persist it.
    ///
    /// The counter increment is in-memory and atomic; the updated counter is
    /// persisted after the task so a crash can never re-issue a used id.
    pub fn create(&self, spec: TaskSpec) -> Result<Task> {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let now = chrono::Utc::now();

        let task = Task {
            id,
            site: spec.site,
            comicid: spec.comicid,
            chapter: spec.chapter,
            send_mail: spec.send_mail,
            gen_pdf: spec.gen_pdf,
            receivers: spec.receivers,
            status: TaskStatus::Queued,
            error: None,
            created_at: now,
            updated_at: now,
        };

        self.tasks.insert(id.to_be_bytes(), serde_json::to_vec(&task)?)?;
        self.metadata.insert(b"next_id", (id + 1).to_be_bytes())?;

        debug!(id, site = %task.site, comicid = %task.comicid, "Task created");

        Ok(task)
    }

    /// Retrieve a task by id
    pub fn get(&self, id: u64) -> Result<Option<Task>> {
        match self.tasks.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write a task record; `updated_at` is refreshed.
    /// Only the executing worker calls this after creation.
    pub fn update<F>(&self, id: u64, mutate: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut task = self.get(id)?.ok_or(StoreError::TaskNotFound(id))?;
        mutate(&mut task);
        task.updated_at = chrono::Utc::now();
        self.tasks.insert(id.to_be_bytes(), serde_json::to_vec(&task)?)?;
        Ok(task)
    }

    pub fn set_status(&self, id: u64, status: TaskStatus) -> Result<Task> {
        self.update(id, |task| {
            task.status = status;
        })
    }

    pub fn set_failed(&self, id: u64, message: impl Into<String>) -> Result<Task> {
        let message = message.into();
        self.update(id, |task| {
            task.status = TaskStatus::Failed;
            task.error = Some(message);
        })
    }

    /// One page of tasks, most recent first. `page` is 1-indexed; a page
    /// past the end is an empty list, not an error.
    pub fn list(&self, page: usize, size: usize) -> Result<Vec<Task>> {
        let offset = page.saturating_sub(1) * size;

        let mut out = Vec::with_capacity(size);
        for item in self.tasks.iter().rev().skip(offset).take(size) {
            let (_, value) = item?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.tasks.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::ChapterSelector;
    use tempfile::TempDir;

    fn test_spec(comicid: &str) -> TaskSpec {
        TaskSpec {
            site: "library".to_string(),
            comicid: comicid.to_string(),
            chapter: ChapterSelector::Unspecified,
            send_mail: false,
            gen_pdf: false,
            receivers: Vec::new(),
        }
    }

    fn open_store() -> (TaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = TaskStore::open(temp_dir.path().join("tasks")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn ids_are_monotonic_from_one() {
        let (store, _temp) = open_store();

        let first = store.create(test_spec("1")).unwrap();
        let second = store.create(test_spec("2")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, TaskStatus::Queued);
    }

    #[test]
    fn counter_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks");

        {
            let store = TaskStore::open(&path).unwrap();
            store.create(test_spec("1")).unwrap();
            store.create(test_spec("2")).unwrap();
            store.persist().unwrap();
        }

        let store = TaskStore::open(&path).unwrap();
        let task = store.create(test_spec("3")).unwrap();
        assert_eq!(task.id, 3);
    }

    #[test]
    fn status_transitions_are_persisted() {
        let (store, _temp) = open_store();
        let task = store.create(test_spec("1")).unwrap();

        store.set_status(task.id, TaskStatus::Running).unwrap();
        let failed = store.set_failed(task.id, "boom").unwrap();

        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));

        let reread = store.get(task.id).unwrap().unwrap();
        assert_eq!(reread.status, TaskStatus::Failed);
    }

    #[test]
    fn update_missing_task_fails_typed() {
        let (store, _temp) = open_store();
        let err = store.set_status(999, TaskStatus::Running).unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(999)));
    }

    #[test]
    fn list_pages_most_recent_first() {
        let (store, _temp) = open_store();
        for i in 0..5 {
            store.create(test_spec(&i.to_string())).unwrap();
        }

        let first_page = store.list(1, 2).unwrap();
        assert_eq!(
            first_page.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![5, 4]
        );

        let second_page = store.list(2, 2).unwrap();
        assert_eq!(
            second_page.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![3, 2]
        );
    }

    #[test]
    fn list_past_end_is_empty() {
        let (store, _temp) = open_store();
        store.create(test_spec("1")).unwrap();

        assert!(store.list(99, 20).unwrap().is_empty());
    }
}
