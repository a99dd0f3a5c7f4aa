use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Dog;

/// Request body for creating a dog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDogRequest {
    #[serde(default, alias = "contentRef")]
    pub idea_id: String,
    #[serde(default)]
    pub schedule_type: String,
    #[serde(default)]
    pub schedule: Value,
}

/// Client-facing view of a dog. Task fields are internal and never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogView {
    pub id: String,
    pub creation_time: DateTime<Utc>,
    pub idea_id: String,
    pub schedule_type: String,
    pub schedule: Value,
}

impl From<&Dog> for DogView {
    fn from(dog: &Dog) -> Self {
        Self {
            id: dog.id.clone(),
            creation_time: dog.creation_time,
            idea_id: dog.idea_id.clone(),
            schedule_type: dog.schedule_type.clone(),
            schedule: dog.schedule_raw.clone(),
        }
    }
}

/// Request body for creating an idea.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIdeaRequest {
    #[serde(default)]
    pub text: String,
}

/// Standard error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_text: String,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
}
