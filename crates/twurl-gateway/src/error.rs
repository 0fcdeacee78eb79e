use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use twurl_core::ShortenerError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    /// The request could not be decoded into the expected shape.
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    field: Option<&'static str>,
}

impl AppError {
    fn parts(self) -> (StatusCode, ErrorDetail) {
        let detail = |code, message, field| ErrorDetail {
            code,
            message,
            field,
        };

        match self {
            AppError::Shortener(ShortenerError::Validation { field, message }) => (
                StatusCode::BAD_REQUEST,
                detail("validation_failed", message, Some(field)),
            ),
            AppError::Shortener(ShortenerError::NotFound) => (
                StatusCode::NOT_FOUND,
                detail("not_found", "short url not found".to_string(), None),
            ),
            AppError::Shortener(ShortenerError::GenerationExhausted { attempts }) => {
                error!(attempts, "short code space looks saturated");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    detail(
                        "generation_exhausted",
                        "could not allocate a short code, try again".to_string(),
                        None,
                    ),
                )
            }
            AppError::Shortener(ShortenerError::StoreUnavailable(e)) => {
                error!(error = %e, "storage failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    detail(
                        "storage_unavailable",
                        "storage is unavailable".to_string(),
                        None,
                    ),
                )
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                detail("validation_failed", message, None),
            ),
            AppError::Internal(message) => {
                error!(%message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    detail("internal", "internal server error".to_string(), None),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        (status, Json(ErrorBody { error })).into_response()
    }
}
