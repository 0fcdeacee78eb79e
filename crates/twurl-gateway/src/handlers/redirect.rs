use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use twurl_core::ShortenerError;

/// Follows a short link with a `302 Found`.
///
/// The path segment is handed to the shortener as is. Malformed codes,
/// including segments that do not decode to UTF-8, get the same 404 as
/// unknown ones.
pub async fn redirect_handler(
    State(state): State<AppState>,
    code: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Ok(Path(code)) = code else {
        return Err(ShortenerError::NotFound.into());
    };

    let original_url = state.shortener().resolve(&code).await?;

    let location = HeaderValue::try_from(original_url)
        .map_err(|e| AppError::Internal(format!("stored url is not a valid header: {e}")))?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
