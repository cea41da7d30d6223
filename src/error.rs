use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text that is safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            // Database messages are already sanitized by the conversions below.
            ApiError::Database(message) => message.clone(),
            ApiError::Validation(message) | ApiError::Conflict(message) => message.clone(),
            ApiError::NotFound(resource) => format!("{} not found", resource),
            ApiError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(ref message) => {
                tracing::error!("Request failed with database error: {}", message)
            }
            ApiError::Internal(ref err) => tracing::error!("Internal server error: {:#}", err),
            ApiError::Validation(ref message) => tracing::debug!("Validation error: {}", message),
            ApiError::NotFound(ref resource) => tracing::debug!("Resource not found: {}", resource),
            ApiError::Conflict(ref message) => tracing::debug!("Constraint conflict: {}", message),
        }

        let body = Json(json!({
            "ok": false,
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

// PostgreSQL error mapping
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        let constraint = err
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or_default()
            .to_string();

        match err.code() {
            Some(&SqlState::UNIQUE_VIOLATION) => {
                let message = if constraint.contains("email") {
                    "Email address already exists"
                } else {
                    "Resource already exists"
                };
                ApiError::Conflict(message.to_string())
            }
            Some(&SqlState::FOREIGN_KEY_VIOLATION) => {
                let message = if constraint.contains("author") {
                    "Referenced author does not exist"
                } else {
                    "Referenced resource does not exist"
                };
                ApiError::Validation(message.to_string())
            }
            Some(&SqlState::NOT_NULL_VIOLATION) => {
                let column = err.as_db_error().and_then(|db| db.column());
                let message = match column {
                    Some(column) => format!("Required field '{}' is missing", column),
                    None => "Required field is missing".to_string(),
                };
                ApiError::Validation(message)
            }
            Some(&SqlState::CHECK_VIOLATION) => {
                ApiError::Validation("Data validation constraint violated".to_string())
            }
            Some(&SqlState::INVALID_TEXT_REPRESENTATION) => {
                ApiError::Validation("Invalid data format provided".to_string())
            }
            Some(&SqlState::NUMERIC_VALUE_OUT_OF_RANGE) => {
                ApiError::Validation("Numeric value is out of range".to_string())
            }
            Some(&SqlState::STRING_DATA_RIGHT_TRUNCATION) => {
                ApiError::Validation("Text data exceeds maximum length".to_string())
            }
            Some(&SqlState::CONNECTION_EXCEPTION)
            | Some(&SqlState::CONNECTION_DOES_NOT_EXIST)
            | Some(&SqlState::CONNECTION_FAILURE) => {
                tracing::error!("PostgreSQL connection error: {}", err);
                ApiError::Database("Database service is temporarily unavailable".to_string())
            }
            _ => {
                tracing::error!("Unhandled PostgreSQL error: {} (code: {:?})", err, err.code());
                ApiError::Database("A database error occurred".to_string())
            }
        }
    }
}

// Connection pool error mapping
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                tracing::warn!("Database connection pool timeout: {}", err);
                ApiError::Database("Database operation timed out, please try again".to_string())
            }
            deadpool_postgres::PoolError::Closed => {
                tracing::error!("Database connection pool is closed");
                ApiError::Database("Database service is temporarily unavailable".to_string())
            }
            deadpool_postgres::PoolError::Backend(err) => ApiError::from(err),
            _ => {
                tracing::error!("Database connection pool error: {}", err);
                ApiError::Database("Database service is temporarily unavailable".to_string())
            }
        }
    }
}

// Result type alias for convenience
pub type ApiResult<T> = Result<T, ApiError>;
