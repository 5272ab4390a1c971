use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use calendar_core::DomainError;
use calendar_infra::store::StoreError;
use calendar_infra::{RepositoryError, ServiceError};

use crate::app::services::RunError;

pub fn run_error_to_response(err: RunError) -> axum::response::Response {
    match err {
        RunError::Service(e) => service_error_to_response(e),
        RunError::Join(msg) => {
            tracing::error!(error = %msg, "calendar task aborted");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Repository(RepositoryError::Store(StoreError::Conflict(msg))) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ServiceError::Repository(RepositoryError::Store(e)) => {
            tracing::error!(error = %e, "calendar store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        ServiceError::Poisoned => {
            tracing::error!("calendar service lock poisoned");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
        }
        ServiceError::MissingCollaborator(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
