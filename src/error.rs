use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::{PairingError, ParseError};
use crate::models::ErrorResponse;
use crate::services::{AuthError, CacheError, PostgresError};

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Short machine-readable kind used in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

impl From<PostgresError> for ApiError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            PostgresError::Forbidden(msg) => ApiError::Forbidden(msg),
            PostgresError::Conflict(msg) => ApiError::Conflict(msg),
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::Internal("Database operation failed".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::JwksError(e) => {
                tracing::error!("Unable to load signing keys: {}", e);
                ApiError::Internal("Unable to verify credentials".to_string())
            }
            other => {
                tracing::debug!("Rejected credentials: {}", other);
                ApiError::Unauthorized(other.to_string())
            }
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        tracing::error!("Cache error: {}", err);
        ApiError::Internal("Cache operation failed".to_string())
    }
}

impl From<PairingError> for ApiError {
    fn from(err: PairingError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Validation failed: {}", err))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query: {}", err)).into()
}
