//! Error handlers
//!
//! Turns every error condition into an HTTP status and a JSON body. Messages sent to
//! the client never include internal filesystem paths; details of server-side failures
//! only go to the log.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::types::{AuthError, ChatError, StorageError};

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    Storage(StorageError),
    Auth(AuthError),
    Chat(ChatError),
    BadRequest(String),
    Forbidden(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        ApiError::Storage(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Auth(error)
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        ApiError::Chat(error)
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Storage(e) => match e {
            StorageError::Containment(_)
            | StorageError::NotADirectory(_)
            | StorageError::NotAFile(_)
            | StorageError::InvalidName(_)
            | StorageError::RootNotRemovable => StatusCode::BAD_REQUEST,
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::Filesystem(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ApiError::Auth(e) => match e {
            AuthError::NotAuthenticated | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::NotAllowed(_) => StatusCode::FORBIDDEN,
            AuthError::OAuth(_) => StatusCode::BAD_REQUEST,
            AuthError::Http(_) => StatusCode::BAD_GATEWAY,
            AuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ApiError::Chat(e) => match e {
            ChatError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            ChatError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::Http(_) | ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
        },
        ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the client
pub fn error_to_message(err: &ApiError) -> String {
    match err {
        ApiError::Storage(StorageError::Filesystem(_))
        | ApiError::Auth(AuthError::Token(_))
        | ApiError::Internal(_) => "Internal server error".to_string(),
        ApiError::Storage(e) => e.to_string(),
        ApiError::Auth(e) => e.to_string(),
        ApiError::Chat(e) => e.to_string(),
        ApiError::BadRequest(msg) | ApiError::Forbidden(msg) => msg.clone(),
    }
}

/// Log a handler error with its full detail
pub fn handle_error(err: &ApiError, status: StatusCode) {
    if status.is_server_error() {
        error!("Request failed ({}): {:?}", status, err);
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = error_to_status(&self);
        handle_error(&self, status);
        let body = serde_json::json!({
            "status": "error",
            "error": error_to_message(&self),
        });
        (status, Json(body)).into_response()
    }
}
