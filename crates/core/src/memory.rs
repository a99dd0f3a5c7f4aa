use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::TaskHandle;
use crate::store::{Document, DocumentStore, TaskQueue};
use crate::util::new_ulid;

/// In-memory document store. Not durable; for tests and local runs.
pub struct MemoryStore<T> {
    docs: Mutex<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.docs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MemoryStore<T> {
    async fn get(&self, id: &str) -> Result<T> {
        lock(&self.docs)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }

    async fn put(&self, doc: &T) -> Result<()> {
        lock(&self.docs).insert(doc.id().to_string(), doc.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        lock(&self.docs)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }
}

/// A task accepted by [`MemoryTaskQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    pub handle: TaskHandle,
    pub target: String,
}

/// Task queue that only records what it was asked to schedule. Nothing ever
/// fires.
pub struct MemoryTaskQueue {
    queue: String,
    tasks: Mutex<HashMap<String, PendingTask>>,
}

impl MemoryTaskQueue {
    /// `queue` prefixes generated task names.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of outstanding tasks, ordered by schedule time.
    pub fn pending(&self) -> Vec<PendingTask> {
        let mut tasks: Vec<_> = lock(&self.tasks).values().cloned().collect();
        tasks.sort_by(|a, b| a.handle.schedule_time.cmp(&b.handle.schedule_time));
        tasks
    }
}

impl Default for MemoryTaskQueue {
    fn default() -> Self {
        Self::new("local")
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn create(&self, schedule_time: DateTime<Utc>, target: &str) -> Result<TaskHandle> {
        let handle = TaskHandle {
            name: format!("{}/tasks/{}", self.queue, new_ulid()),
            schedule_time,
        };
        lock(&self.tasks).insert(
            handle.name.clone(),
            PendingTask {
                handle: handle.clone(),
                target: target.to_string(),
            },
        );
        Ok(handle)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        lock(&self.tasks)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("task", name))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
