//! Task queue client for the Google Cloud Tasks REST API (v2).

use async_trait::async_trait;
use bark_core::model::TaskHandle;
use bark_core::store::TaskQueue;
use bark_core::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Creates App Engine HTTP tasks that POST to a relative URI of this service.
#[derive(Clone)]
pub struct CloudTasksClient {
    http: reqwest::Client,
    base_url: String,
    queue: String,
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    name: String,
    #[serde(default)]
    schedule_time: Option<DateTime<Utc>>,
}

impl CloudTasksClient {
    /// `queue` is the full resource name,
    /// `projects/<project>/locations/<location>/queues/<queue>`.
    pub fn new(base_url: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            queue: queue.into(),
            token: None,
        }
    }

    /// Sends `token` as a bearer token on every call.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl TaskQueue for CloudTasksClient {
    async fn create(&self, schedule_time: DateTime<Utc>, target: &str) -> Result<TaskHandle> {
        let url = format!("{}/v2/{}/tasks", self.base_url, self.queue);
        let body = json!({
            "task": {
                "scheduleTime": schedule_time.to_rfc3339_opts(SecondsFormat::Secs, true),
                "appEngineHttpRequest": {
                    "httpMethod": "POST",
                    "relativeUri": target,
                }
            }
        });

        let resp = self
            .authorize(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(Error::task_queue)?;
        let resp = check(resp, "create task").await?;
        let task: TaskResponse = resp.json().await.map_err(Error::task_queue)?;

        debug!(task_name = %task.name, relative_uri = target, "cloud task created");
        Ok(TaskHandle {
            name: task.name,
            schedule_time: task.schedule_time.unwrap_or(schedule_time),
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let url = format!("{}/v2/{}", self.base_url, name);
        let resp = self
            .authorize(self.http.delete(&url))
            .send()
            .await
            .map_err(Error::task_queue)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found("task", name));
        }
        check(resp, "delete task").await?;
        debug!(task_name = name, "cloud task deleted");
        Ok(())
    }
}

async fn check(resp: Response, action: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::task_queue(format!("{action}: {status}: {body}")))
}
