// HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::constants::{ERR_INTERNAL, ERR_INVALID_FILE, ERR_UNAUTHORIZED};
use crate::error::ThemeError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Missing or invalid caller identity")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Theme(ThemeError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Theme(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Theme(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ApiError::Theme(e) => e.key(),
            ApiError::BadRequest(_) => ERR_INVALID_FILE,
            ApiError::Unauthorized => ERR_UNAUTHORIZED,
            ApiError::Internal(_) => ERR_INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side details stay in the log
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: self.key(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
