use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::store::StateStoreError;

/// Structural defect in a tasklist document. Displays the bare message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub tasklist_id: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(tasklist_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            tasklist_id: tasklist_id.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Errors surfaced to the HTTP boundary while serving a tasklist.
#[derive(Debug, thiserror::Error)]
pub enum TasklistError {
    #[error("Tasklist '{tasklist_id}' not found: {message}")]
    NotFound {
        tasklist_id: String,
        message: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to generate tasklist '{tasklist_id}': {message}")]
    Generation {
        tasklist_id: String,
        message: String,
    },
    #[error("Subsection '{subsection_id}' is not part of tasklist '{tasklist_id}'")]
    UnknownSubsection {
        tasklist_id: String,
        subsection_id: String,
    },
    #[error(transparent)]
    State(#[from] StateStoreError),
}

impl TasklistError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::UnknownSubsection { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Generation { .. } | Self::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn tasklist_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { tasklist_id, .. }
            | Self::Generation { tasklist_id, .. }
            | Self::UnknownSubsection { tasklist_id, .. } => Some(tasklist_id),
            Self::Validation(err) => err.tasklist_id.as_deref(),
            Self::State(_) => None,
        }
    }

    pub fn response_body(&self) -> Value {
        json!({
            "error": self.to_string(),
            "tasklistId": self.tasklist_id(),
        })
    }
}

impl IntoResponse for TasklistError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.response_body())).into_response()
    }
}
