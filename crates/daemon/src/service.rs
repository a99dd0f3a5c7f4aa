use std::sync::Arc;

use bark_core::memory::{MemoryStore, MemoryTaskQueue};
use bark_core::model::{Dog, Idea};
use bark_core::registry::DogRegistry;
use bark_core::store::{DogStore, IdeaStore, TaskQueue};
use tracing::info;

use crate::config::{DaemonConfig, StoreBackend, TaskQueueBackend};
use crate::db::Db;
use crate::tasks::CloudTasksClient;

/// Backends selected at startup, shared by every request.
#[derive(Clone)]
pub struct Services {
    pub dogs: Arc<DogStore>,
    pub ideas: Arc<IdeaStore>,
    pub tasks: Arc<dyn TaskQueue>,
}

impl Services {
    /// Builds the backends named in `config`.
    pub async fn from_config(config: &DaemonConfig) -> anyhow::Result<Self> {
        let (dogs, ideas) = match config.store {
            StoreBackend::Memory => memory_stores(),
            StoreBackend::Surreal => {
                let db = Db::connect(&config.db_endpoint).await?;
                let dogs: Arc<DogStore> = Arc::new(db.store::<Dog>());
                let ideas: Arc<IdeaStore> = Arc::new(db.store::<Idea>());
                (dogs, ideas)
            }
        };

        let tasks: Arc<dyn TaskQueue> = match config.task_queue {
            TaskQueueBackend::Memory => {
                let queue = if config.queue_name.is_empty() {
                    "local"
                } else {
                    config.queue_name.as_str()
                };
                Arc::new(MemoryTaskQueue::new(queue))
            }
            TaskQueueBackend::CloudTasks => {
                let mut client = CloudTasksClient::new(&config.tasks_base_url, &config.queue_name);
                if let Some(token) = &config.tasks_token {
                    client = client.with_token(token);
                }
                Arc::new(client)
            }
        };

        info!(store = ?config.store, task_queue = ?config.task_queue, "services ready");
        Ok(Self { dogs, ideas, tasks })
    }

    /// Memory stores and a memory task queue.
    pub fn in_memory() -> Self {
        let (dogs, ideas) = memory_stores();
        Self {
            dogs,
            ideas,
            tasks: Arc::new(MemoryTaskQueue::default()),
        }
    }

    /// Registry over these services' dog store and task queue.
    pub fn registry(&self) -> DogRegistry {
        DogRegistry::new(self.dogs.clone(), self.tasks.clone())
    }
}

fn memory_stores() -> (Arc<DogStore>, Arc<IdeaStore>) {
    let dogs: Arc<DogStore> = Arc::new(MemoryStore::<Dog>::new());
    let ideas: Arc<IdeaStore> = Arc::new(MemoryStore::<Idea>::new());
    (dogs, ideas)
}
