//! HTTP surface: dogs, ideas and a health probe.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bark_core::api::{CreateDogRequest, CreateIdeaRequest, DogView, ErrorBody, HealthResponse};
use bark_core::model::{Dog, Idea};
use bark_core::registry::DogRegistry;
use bark_core::store::IdeaStore;
use bark_core::validation::{validate_create_dog, validate_create_idea};
use bark_core::{Error, Result};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info_span};

/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 20_000;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    registry: DogRegistry,
    ideas: Arc<IdeaStore>,
    deadline: Duration,
}

impl AppState {
    /// State over `services`, with `deadline` applied to every backend call.
    pub fn new(services: &crate::service::Services, deadline: Duration) -> Self {
        Self {
            registry: services.registry(),
            ideas: services.ideas.clone(),
            deadline,
        }
    }
}

/// Builds the router with tracing and request-ID layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/dogs", post(post_dog))
        .route("/dogs/{dog_id}", get(get_dog).delete(delete_dog))
        .route("/ideas", post(post_idea))
        .route("/ideas/{idea_id}", get(get_idea))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { healthy: true })
}

async fn post_dog(
    State(st): State<AppState>,
    body: std::result::Result<Json<CreateDogRequest>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<DogView>), AppError> {
    let Json(req) = body?;
    validate_create_dog(&req).into_result()?;

    let dog = Dog::new(req.idea_id, req.schedule_type, req.schedule);
    // Reject bad schedules before touching any backend.
    dog.schedule()?;

    let AppState {
        registry, ideas, ..
    } = &st;
    let dog = within(st.deadline, async move {
        ideas.get(&dog.idea_id).await?;
        registry.register(dog).await
    })
    .await?;

    Ok((StatusCode::CREATED, Json(DogView::from(&dog))))
}

async fn get_dog(
    State(st): State<AppState>,
    Path(dog_id): Path<String>,
) -> std::result::Result<Json<DogView>, AppError> {
    let dog = within(st.deadline, st.registry.get(&dog_id)).await?;
    Ok(Json(DogView::from(&dog)))
}

async fn delete_dog(
    State(st): State<AppState>,
    Path(dog_id): Path<String>,
) -> std::result::Result<StatusCode, AppError> {
    within(st.deadline, st.registry.unregister(&dog_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn post_idea(
    State(st): State<AppState>,
    body: std::result::Result<Json<CreateIdeaRequest>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<Idea>), AppError> {
    let Json(req) = body?;
    validate_create_idea(&req).into_result()?;

    let idea = Idea::new(req.text);
    within(st.deadline, st.ideas.put(&idea)).await?;
    debug!(idea_id = %idea.id, "idea created");
    Ok((StatusCode::CREATED, Json(idea)))
}

async fn get_idea(
    State(st): State<AppState>,
    Path(idea_id): Path<String>,
) -> std::result::Result<Json<Idea>, AppError> {
    let idea = within(st.deadline, st.ideas.get(&idea_id)).await?;
    Ok(Json(idea))
}

/// Runs `fut`, failing with [`Error::DeadlineExceeded`] once `deadline` passes.
async fn within<T>(deadline: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| Error::DeadlineExceeded)?
}

/// Handler error, rendered as `{"errorText": ...}`.
#[derive(Debug)]
pub enum AppError {
    /// Failure from the registry, a store or validation.
    Bark(Error),
    /// Request body over [`MAX_BODY_BYTES`].
    PayloadTooLarge,
}

impl From<Error> for AppError {
    fn from(value: Error) -> Self {
        Self::Bark(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Bark(Error::Validation(rejection.body_text()))
        }
    }
}

/// Status code for a bark error.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        err if err.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_text) = match self {
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body exceeds {MAX_BODY_BYTES} bytes"),
            ),
            Self::Bark(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(error = %err, "request failed");
                    (status, "internal error occurred".to_string())
                } else {
                    debug!(error = %err, status = status.as_u16(), "request rejected");
                    (status, err.to_string())
                }
            }
        };
        (status, Json(ErrorBody { error_text })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&Error::not_found("idea", "I1")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&Error::UnsupportedScheduleType("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::InvalidScheduleSpec("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&Error::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::store("down")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&Error::task_queue("down")), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&Error::DeadlineExceeded), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn deadline_turns_into_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let err = within(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
    }
}
