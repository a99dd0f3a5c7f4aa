//! Collaborator interfaces consumed by the registry.
//!
//! Backends are picked at startup; anything holding these traits only sees
//! `Arc<dyn ...>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::model::{Dog, Idea, TaskHandle};

/// An entity that can be kept in a [`DocumentStore`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Entity kind, used as collection name and in not-found errors.
    const KIND: &'static str;

    /// Identifier the document is stored under.
    fn id(&self) -> &str;
}

/// Durable get/put/delete of documents by ID.
#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// Fetches a document; `NotFound` if absent.
    async fn get(&self, id: &str) -> Result<T>;

    /// Inserts or overwrites a document.
    async fn put(&self, doc: &T) -> Result<()>;

    /// Removes a document; `NotFound` if absent.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Store of dogs.
pub type DogStore = dyn DocumentStore<Dog>;

/// Store of ideas. Registration only ever calls `get` on it.
pub type IdeaStore = dyn DocumentStore<Idea>;

/// External dispatcher of deferred one-shot tasks.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Schedules a call to `target` at `schedule_time`.
    async fn create(&self, schedule_time: DateTime<Utc>, target: &str) -> Result<TaskHandle>;

    /// Cancels a task; `NotFound` if it no longer exists.
    async fn delete(&self, name: &str) -> Result<()>;
}
