use crate::FieldErrors;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::BadRequest(msg) | Self::Forbidden(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Unauthorized => "Please log in first.".to_string(),
            Self::NotFound(what) => format!("{} not found", what),
            Self::Database(_) | Self::Internal(_) => {
                "Something went wrong on our side. Try again later.".to_string()
            }
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

#[cfg(feature = "db")]
mod db_impl {
    use super::AppError;
    use sea_orm::{DbErr, SqlErr};

    impl From<DbErr> for AppError {
        fn from(err: DbErr) -> Self {
            if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
                tracing::debug!(%detail, "unique constraint violated");
                return AppError::Conflict("That record already exists".to_string());
            }
            match err {
                DbErr::RecordNotFound(what) => AppError::NotFound(what),
                other => AppError::Database(other.to_string()),
            }
        }
    }
}

#[cfg(feature = "http")]
mod http_impl {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse {
        status: &'static str,
        message: String,
    }

    impl AppError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                AppError::Validation(_) | AppError::BadRequest(_) | AppError::Conflict(_) => {
                    StatusCode::BAD_REQUEST
                }
                AppError::Unauthorized => StatusCode::UNAUTHORIZED,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::Database(_) | AppError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            if self.is_server_error() {
                tracing::error!(error = %self, "request failed");
            } else {
                tracing::debug!(error = %self, "request rejected");
            }
            let body = ErrorResponse {
                status: "error",
                message: self.user_message(),
            };
            (status, Json(body)).into_response()
        }
    }
}
