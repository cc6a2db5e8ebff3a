use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::jira::client::{ProviderError, TicketProvider};
use crate::jira::options::JiraOptions;
use crate::room::registry::RoomRegistry;
use crate::room::room::RoomError;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub ticket_provider: Arc<dyn TicketProvider>,
    pub jira_options: Arc<JiraOptions>,
}

impl AppState {
    pub fn new(
        registry: Arc<RoomRegistry>,
        ticket_provider: Arc<dyn TicketProvider>,
        jira_options: Arc<JiraOptions>,
    ) -> Self {
        Self {
            registry,
            ticket_provider,
            jira_options,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Room disposed: {0}")]
    RoomDisposed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidOperation(msg) => (StatusCode::CONFLICT, msg),
            AppError::RoomDisposed(msg) => (StatusCode::GONE, format!("Room disposed: {}", msg)),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::Disposed(code) => AppError::RoomDisposed(code),
            RoomError::NoVotesCast => AppError::InvalidOperation("no votes cast".to_string()),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Status(401) => {
                AppError::Unauthorized("ticket provider rejected the token".to_string())
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Extracts the access token from an `Authorization: Bearer …` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))
}
