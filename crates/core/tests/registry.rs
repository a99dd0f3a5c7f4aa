use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bark_core::memory::{MemoryStore, MemoryTaskQueue};
use bark_core::model::{Dog, TaskHandle};
use bark_core::registry::{callback_target, DogRegistry};
use bark_core::store::{DocumentStore, TaskQueue};
use bark_core::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, call: String) {
    log.lock().unwrap().push(call);
}

/// Store wrapper that logs calls and can be told to fail `put` or `delete`.
struct FlakyStore {
    inner: MemoryStore<Dog>,
    log: CallLog,
    fail_put: bool,
    fail_delete: bool,
}

#[async_trait]
impl DocumentStore<Dog> for FlakyStore {
    async fn get(&self, id: &str) -> Result<Dog> {
        record(&self.log, format!("store.get {id}"));
        self.inner.get(id).await
    }

    async fn put(&self, doc: &Dog) -> Result<()> {
        record(&self.log, format!("store.put {}", doc.id));
        if self.fail_put {
            return Err(Error::store("disk full"));
        }
        self.inner.put(doc).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        record(&self.log, format!("store.delete {id}"));
        if self.fail_delete {
            return Err(Error::store("disk gone"));
        }
        self.inner.delete(id).await
    }
}

#[derive(Clone, Copy, PartialEq)]
enum QueueMode {
    Ok,
    FailCreate,
    FailDelete,
    DeleteNotFound,
}

struct FlakyQueue {
    inner: MemoryTaskQueue,
    log: CallLog,
    mode: QueueMode,
}

#[async_trait]
impl TaskQueue for FlakyQueue {
    async fn create(&self, schedule_time: DateTime<Utc>, target: &str) -> Result<TaskHandle> {
        record(&self.log, format!("tasks.create {target}"));
        if self.mode == QueueMode::FailCreate {
            return Err(Error::task_queue("quota exceeded"));
        }
        self.inner.create(schedule_time, target).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        record(&self.log, "tasks.delete".to_string());
        match self.mode {
            QueueMode::FailDelete => Err(Error::task_queue("unavailable")),
            QueueMode::DeleteNotFound => Err(Error::not_found("task", name)),
            _ => self.inner.delete(name).await,
        }
    }
}

struct Harness {
    registry: DogRegistry,
    store: Arc<FlakyStore>,
    queue: Arc<FlakyQueue>,
    log: CallLog,
}

impl Harness {
    fn new(mode: QueueMode) -> Self {
        Self::with_store(mode, false, false)
    }

    fn with_store(mode: QueueMode, fail_put: bool, fail_delete: bool) -> Self {
        let log = CallLog::default();
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            log: log.clone(),
            fail_put,
            fail_delete,
        });
        let queue = Arc::new(FlakyQueue {
            inner: MemoryTaskQueue::new("projects/p/locations/l/queues/bark"),
            log: log.clone(),
            mode,
        });
        Self {
            registry: DogRegistry::new(store.clone(), queue.clone()),
            store,
            queue,
            log,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

fn sunday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 8, 30, 0).unwrap()
}

fn daily_dog() -> Dog {
    Dog::new("I1", "cron", json!("0 9 * * *"))
}

#[tokio::test]
async fn register_creates_task_then_stores_record() {
    let h = Harness::new(QueueMode::Ok);
    let dog = daily_dog();
    let id = dog.id.clone();

    let dog = h.registry.register_at(dog, sunday_morning()).await.unwrap();

    let task = dog.next_task.clone().unwrap();
    assert_eq!(task.schedule_time, Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap());
    assert!(task.name.starts_with("projects/p/locations/l/queues/bark/tasks/"));
    assert_eq!(
        h.calls(),
        vec![format!("tasks.create /dogs/{id}/bark"), format!("store.put {id}")]
    );

    let stored = h.store.inner.get(&id).await.unwrap();
    assert_eq!(stored.next_task, Some(task));
    let pending = h.queue.inner.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].target, callback_target(&id));
}

#[tokio::test]
async fn unsupported_schedule_has_no_side_effects() {
    let h = Harness::new(QueueMode::Ok);
    let dog = Dog::new("I1", "weekly", json!("0 9 * * *"));

    let err = h.registry.register_at(dog, sunday_morning()).await.unwrap_err();

    assert!(matches!(err, Error::UnsupportedScheduleType(_)));
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn schedule_without_future_occurrence_is_invalid() {
    let h = Harness::new(QueueMode::Ok);
    let dog = Dog::new("I1", "cron", json!("0 0 30 2 *"));

    let err = h.registry.register_at(dog, sunday_morning()).await.unwrap_err();

    assert!(matches!(err, Error::InvalidScheduleSpec(_)));
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn failed_task_create_stores_nothing() {
    let h = Harness::new(QueueMode::FailCreate);
    let dog = daily_dog();
    let id = dog.id.clone();

    let err = h.registry.register_at(dog, sunday_morning()).await.unwrap_err();

    assert!(matches!(err, Error::TaskQueue(_)));
    assert_eq!(h.calls(), vec![format!("tasks.create /dogs/{id}/bark")]);
    assert!(h.store.inner.is_empty());
}

#[tokio::test]
async fn failed_put_leaves_orphaned_task() {
    let h = Harness::with_store(QueueMode::Ok, true, false);

    let err = h.registry.register_at(daily_dog(), sunday_morning()).await.unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    assert!(h.store.inner.is_empty());
    assert_eq!(h.queue.inner.pending().len(), 1);
}

#[tokio::test]
async fn unregister_deletes_task_then_record() {
    let h = Harness::new(QueueMode::Ok);
    let dog = h.registry.register_at(daily_dog(), sunday_morning()).await.unwrap();
    h.clear();

    h.registry.unregister(&dog.id).await.unwrap();

    assert_eq!(
        h.calls(),
        vec![
            format!("store.get {}", dog.id),
            "tasks.delete".to_string(),
            format!("store.delete {}", dog.id),
        ]
    );
    assert!(h.queue.inner.pending().is_empty());
    assert!(h.registry.get(&dog.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn unregister_tolerates_missing_task() {
    let h = Harness::new(QueueMode::DeleteNotFound);
    let dog = h.registry.register_at(daily_dog(), sunday_morning()).await.unwrap();

    h.registry.unregister(&dog.id).await.unwrap();

    assert!(h.store.inner.is_empty());
}

#[tokio::test]
async fn unregister_keeps_record_when_task_delete_fails() {
    let h = Harness::new(QueueMode::FailDelete);
    let dog = h.registry.register_at(daily_dog(), sunday_morning()).await.unwrap();

    let err = h.registry.unregister(&dog.id).await.unwrap_err();

    assert!(matches!(err, Error::TaskQueue(_)));
    assert!(!h.calls().contains(&format!("store.delete {}", dog.id)));
    assert_eq!(h.store.inner.len(), 1);
}

#[tokio::test]
async fn unregister_without_task_only_deletes_record() {
    let h = Harness::new(QueueMode::Ok);
    let dog = daily_dog();
    h.store.inner.put(&dog).await.unwrap();

    h.registry.unregister(&dog.id).await.unwrap();

    assert_eq!(
        h.calls(),
        vec![format!("store.get {}", dog.id), format!("store.delete {}", dog.id)]
    );
}

#[tokio::test]
async fn unregister_unknown_dog_is_not_found() {
    let h = Harness::new(QueueMode::Ok);

    let err = h.registry.unregister("nope").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(h.calls(), vec!["store.get nope".to_string()]);
}

#[tokio::test]
async fn store_delete_failure_after_task_delete_surfaces() {
    let h = Harness::with_store(QueueMode::Ok, false, true);
    let dog = h.registry.register_at(daily_dog(), sunday_morning()).await.unwrap();

    let err = h.registry.unregister(&dog.id).await.unwrap_err();

    assert!(matches!(err, Error::Store(_)));
    assert!(h.queue.inner.pending().is_empty());
    assert_eq!(h.store.inner.len(), 1);
}
