//! The dog registry keeps a dog's stored record and its outstanding task in
//! step.
//!
//! Ordering is the only consistency tool: nothing here locks across the store
//! and the queue.
//!
//! - `register`: schedule → task create → record put. A failed put leaves an
//!   orphaned task; it is logged, not rolled back.
//! - `unregister`: record get → task delete → record delete. A crash between
//!   the last two leaves a record pointing at a cancelled task, which a retry
//!   cleans up.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::Dog;
use crate::store::{DogStore, TaskQueue};
use crate::util::now;

/// Callback path the task queue invokes when a dog's task fires.
pub fn callback_target(dog_id: &str) -> String {
    format!("/dogs/{dog_id}/bark")
}

/// Registers and unregisters dogs against a document store and a task queue.
#[derive(Clone)]
pub struct DogRegistry {
    store: Arc<DogStore>,
    tasks: Arc<dyn TaskQueue>,
}

impl DogRegistry {
    pub fn new(store: Arc<DogStore>, tasks: Arc<dyn TaskQueue>) -> Self {
        Self { store, tasks }
    }

    /// Registers `dog` with its first occurrence computed from the current time.
    ///
    /// The caller must already have checked that the dog's idea exists.
    pub async fn register(&self, dog: Dog) -> Result<Dog> {
        self.register_at(dog, now()).await
    }

    /// Registers `dog` with its first occurrence computed from `now`.
    pub async fn register_at(&self, mut dog: Dog, now: DateTime<Utc>) -> Result<Dog> {
        let schedule_time = dog.schedule()?.next_after(now).ok_or_else(|| {
            Error::InvalidScheduleSpec(format!("schedule never fires after {now}"))
        })?;

        let task = self
            .tasks
            .create(schedule_time, &callback_target(&dog.id))
            .await?;
        debug!(dog_id = %dog.id, task_name = %task.name, schedule_time = %task.schedule_time, "task created");

        let task_name = task.name.clone();
        dog.next_task = Some(task);
        if let Err(err) = self.store.put(&dog).await {
            warn!(dog_id = %dog.id, task_name = %task_name, error = %err, "dog not stored; task left orphaned");
            return Err(err);
        }

        info!(dog_id = %dog.id, idea_id = %dog.idea_id, schedule_time = %schedule_time, "dog registered");
        Ok(dog)
    }

    /// Cancels the dog's task, then deletes its record.
    ///
    /// A task that is already gone is not an error. Any other queue failure
    /// aborts and leaves the record in place so the call can be retried.
    pub async fn unregister(&self, id: &str) -> Result<()> {
        let dog = self.store.get(id).await?;

        if let Some(task) = &dog.next_task {
            match self.tasks.delete(&task.name).await {
                Ok(()) => debug!(dog_id = %id, task_name = %task.name, "task deleted"),
                Err(err) if err.is_not_found() => {
                    debug!(dog_id = %id, task_name = %task.name, "task already gone")
                }
                Err(err) => return Err(err),
            }
        }

        self.store.delete(id).await?;
        info!(dog_id = %id, "dog unregistered");
        Ok(())
    }

    /// Fetches a registered dog.
    pub async fn get(&self, id: &str) -> Result<Dog> {
        self.store.get(id).await
    }
}
