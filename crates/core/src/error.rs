//! Error taxonomy shared by the schedule engine, the stores and the registry.

/// Boxed error used to carry backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for bark operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by bark operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schedule discriminator names no known variant.
    #[error("schedule type not supported: {0}")]
    UnsupportedScheduleType(String),

    /// The schedule payload cannot be interpreted by its variant.
    #[error("invalid schedule: {0}")]
    InvalidScheduleSpec(String),

    /// An idea, dog or task does not exist.
    #[error("{kind} not found with ID: {id}")]
    NotFound {
        /// Entity kind, e.g. `idea`.
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The task queue rejected or failed a call.
    #[error("task queue error: {0}")]
    TaskQueue(#[source] BoxError),

    /// The document store failed a call.
    #[error("store error: {0}")]
    Store(#[source] BoxError),

    /// A request field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The operation ran past its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// Builds a [`Error::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wraps a backend failure as a store error.
    pub fn store(err: impl Into<BoxError>) -> Self {
        Self::Store(err.into())
    }

    /// Wraps a dispatch failure as a task queue error.
    pub fn task_queue(err: impl Into<BoxError>) -> Self {
        Self::TaskQueue(err.into())
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for errors caused by the caller's input rather than a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedScheduleType(_) | Self::InvalidScheduleSpec(_) | Self::Validation(_)
        )
    }
}
