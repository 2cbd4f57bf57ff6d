use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::Value;

use super::service::TasklistService;
use super::store::{ApplicantStateStore, TasklistStore};

/// Router builder exposing tasklist rendering and progress endpoints.
pub fn tasklist_router<S, A>(service: Arc<TasklistService<S, A>>) -> Router
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    Router::new()
        .route("/api/v1/tasklists/:tasklist_id", get(anonymous_handler::<S, A>))
        .route(
            "/api/v1/tasklists/:tasklist_id/sessions/:session_id",
            get(session_handler::<S, A>),
        )
        .route(
            "/api/v1/tasklists/:tasklist_id/sessions/:session_id/visits/:subsection_id",
            post(visit_handler::<S, A>),
        )
        .route(
            "/api/v1/tasklists/:tasklist_id/sessions/:session_id/answers/:subsection_id",
            put(answers_handler::<S, A>),
        )
        .with_state(service)
}

pub(crate) async fn anonymous_handler<S, A>(
    State(service): State<Arc<TasklistService<S, A>>>,
    Path(tasklist_id): Path<String>,
) -> Response
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    match service.render(&tasklist_id, None) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn session_handler<S, A>(
    State(service): State<Arc<TasklistService<S, A>>>,
    Path((tasklist_id, session_id)): Path<(String, String)>,
) -> Response
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    match service.render(&tasklist_id, Some(&session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn visit_handler<S, A>(
    State(service): State<Arc<TasklistService<S, A>>>,
    Path((tasklist_id, session_id, subsection_id)): Path<(String, String, String)>,
) -> Response
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    match service.record_visit(&tasklist_id, &session_id, &subsection_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn answers_handler<S, A>(
    State(service): State<Arc<TasklistService<S, A>>>,
    Path((tasklist_id, session_id, subsection_id)): Path<(String, String, String)>,
    Json(answers): Json<Value>,
) -> Response
where
    S: TasklistStore + 'static,
    A: ApplicantStateStore + 'static,
{
    match service.record_answers(&tasklist_id, &session_id, &subsection_id, answers) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
