//! Command-line and environment configuration.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Where dogs and ideas are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Process-local maps; lost on restart.
    Memory,
    /// SurrealDB at `--db-endpoint`.
    Surreal,
}

/// Which task queue receives one-shot tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskQueueBackend {
    /// Records tasks without ever firing them.
    Memory,
    /// Google Cloud Tasks REST API.
    CloudTasks,
}

/// Raw command-line arguments. Every flag can also be set from the
/// environment.
#[derive(Parser, Debug)]
#[command(name = "bark-daemon", version, about = "Schedules dogs against a task queue")]
pub struct Args {
    /// Listen address, e.g. 127.0.0.1:8080
    #[arg(long, env = "BARK_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Document store backend.
    #[arg(long, env = "BARK_STORE", value_enum, default_value_t = StoreBackend::Memory)]
    store: StoreBackend,

    /// SurrealDB endpoint, e.g. surrealkv://.bark/db or mem://
    #[arg(long, env = "BARK_DB_ENDPOINT", default_value = "surrealkv://.bark/db")]
    db_endpoint: String,

    /// Task queue backend.
    #[arg(long, env = "BARK_TASK_QUEUE", value_enum, default_value_t = TaskQueueBackend::Memory)]
    task_queue: TaskQueueBackend,

    /// Fully qualified queue name,
    /// e.g. projects/<project>/locations/<location>/queues/<queue>
    #[arg(long, env = "QUEUE_NAME", default_value = "")]
    queue_name: String,

    /// Base URL of the Cloud Tasks API.
    #[arg(long, env = "BARK_TASKS_BASE_URL", default_value = "https://cloudtasks.googleapis.com")]
    tasks_base_url: String,

    /// Bearer token sent to the Cloud Tasks API.
    #[arg(long, env = "BARK_TASKS_TOKEN", hide_env_values = true)]
    tasks_token: Option<String>,

    /// Per-request deadline in seconds.
    #[arg(long, env = "BARK_REQUEST_TIMEOUT_SECS", default_value_t = 15)]
    request_timeout_secs: u64,

    /// Log filter (env-filter syntax).
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,
}

impl Args {
    /// Converts parsed arguments into a [`DaemonConfig`].
    pub fn into_config(self) -> DaemonConfig {
        DaemonConfig {
            listen: self.listen,
            store: self.store,
            db_endpoint: self.db_endpoint,
            task_queue: self.task_queue,
            queue_name: self.queue_name,
            tasks_base_url: self.tasks_base_url,
            tasks_token: self.tasks_token,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            log: self.log,
        }
    }
}

/// Daemon settings, fixed at startup.
#[derive(Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,
    pub store: StoreBackend,
    pub db_endpoint: String,
    pub task_queue: TaskQueueBackend,
    pub queue_name: String,
    pub tasks_base_url: String,
    pub tasks_token: Option<String>,
    pub request_timeout: Duration,
    pub log: String,
}

impl DaemonConfig {
    /// Rejects combinations that cannot start.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.task_queue == TaskQueueBackend::CloudTasks && self.queue_name.trim().is_empty() {
            anyhow::bail!("--queue-name (QUEUE_NAME) is required with --task-queue cloud-tasks");
        }
        if self.request_timeout.is_zero() {
            anyhow::bail!("--request-timeout-secs must be positive");
        }
        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreBackend::Memory,
            db_endpoint: "surrealkv://.bark/db".to_string(),
            task_queue: TaskQueueBackend::Memory,
            queue_name: String::new(),
            tasks_base_url: "https://cloudtasks.googleapis.com".to_string(),
            tasks_token: None,
            request_timeout: Duration::from_secs(15),
            log: "info".to_string(),
        }
    }
}

// Hand-written so the token never reaches the logs.
impl fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("listen", &self.listen)
            .field("store", &self.store)
            .field("db_endpoint", &self.db_endpoint)
            .field("task_queue", &self.task_queue)
            .field("queue_name", &self.queue_name)
            .field("tasks_base_url", &self.tasks_base_url)
            .field("tasks_token", &self.tasks_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("log", &self.log)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DaemonConfig {
        let argv = std::iter::once("bark-daemon").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--listen",
            "0.0.0.0:9000",
            "--store",
            "surreal",
            "--db-endpoint",
            "mem://",
            "--task-queue",
            "cloud-tasks",
            "--queue-name",
            "projects/p/locations/l/queues/bark",
            "--request-timeout-secs",
            "3",
        ]);
        assert_eq!(config.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.store, StoreBackend::Surreal);
        assert_eq!(config.db_endpoint, "mem://");
        assert_eq!(config.task_queue, TaskQueueBackend::CloudTasks);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        config.validate().unwrap();
    }

    #[test]
    fn cloud_tasks_needs_a_queue_name() {
        let config = DaemonConfig {
            task_queue: TaskQueueBackend::CloudTasks,
            ..DaemonConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("QUEUE_NAME"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = DaemonConfig {
            request_timeout: Duration::ZERO,
            ..DaemonConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        assert!(Args::try_parse_from(["bark-daemon", "--store", "postgres"]).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let config = DaemonConfig {
            tasks_token: Some("s3cret".to_string()),
            ..DaemonConfig::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("<redacted>"));
    }
}
