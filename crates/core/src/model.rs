use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::schedule::Schedule;
use crate::store::Document;
use crate::util::{new_id, now};

/// A Dog is a thing that barks: a schedule on which an idea is "barked" to an
/// end user.
///
/// This is the persisted record. Clients see [`DogView`](crate::api::DogView),
/// which leaves out the task fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: String,
    pub creation_time: DateTime<Utc>,
    pub idea_id: String,
    pub schedule_type: String,
    /// Opaque payload, interpreted by the variant named in `schedule_type`.
    #[serde(rename = "schedule")]
    pub schedule_raw: Value,

    /// Outstanding task in the task queue, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_task: Option<TaskHandle>,

    #[serde(skip)]
    schedule: OnceLock<Schedule>,
}

impl Dog {
    /// New unregistered dog with a fresh ID.
    pub fn new(idea_id: impl Into<String>, schedule_type: impl Into<String>, schedule_raw: Value) -> Self {
        Self {
            id: new_id(),
            creation_time: now(),
            idea_id: idea_id.into(),
            schedule_type: schedule_type.into(),
            schedule_raw,
            next_task: None,
            schedule: OnceLock::new(),
        }
    }

    /// Parsed view of `schedule_raw`, computed on first use and cached for the
    /// lifetime of this value.
    pub fn schedule(&self) -> Result<&Schedule> {
        if let Some(schedule) = self.schedule.get() {
            return Ok(schedule);
        }
        let parsed = Schedule::parse(&self.schedule_type, &self.schedule_raw)?;
        Ok(self.schedule.get_or_init(|| parsed))
    }
}

impl Document for Dog {
    const KIND: &'static str = "dog";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Reference to a one-shot task held by the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    /// Queue-assigned task name.
    pub name: String,
    /// When the task is due to fire.
    pub schedule_time: DateTime<Utc>,
}

/// An idea is a thing people have when they get smart or stupid. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub text: String,
    pub creation_time: DateTime<Utc>,
}

impl Idea {
    /// New idea with a fresh ID.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            creation_time: now(),
        }
    }
}

impl Document for Idea {
    const KIND: &'static str = "idea";

    fn id(&self) -> &str {
        &self.id
    }
}
