use crate::error::Result;
use crate::model::{CreateUrlRequest, CreateUrlResponse, EditNoteRequest, OwnerQuery, UrlResponse};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use twurl_core::{OwnerId, RecordId, ShortenParams, ShortenerError};

pub async fn create_url_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    let Json(request) = request?;

    let record = state
        .shortener()
        .create(ShortenParams {
            original_url: request.original_url,
            owner_id: OwnerId::new(request.owner_id),
            note: request.note,
        })
        .await?;

    info!(
        code = %record.short_code,
        owner_id = %record.owner_id,
        "short url created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse::from_record(record, state.base_url())),
    ))
}

pub async fn get_url_handler(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    query: std::result::Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<Json<UrlResponse>> {
    let Path(id) = id?;
    let Query(query) = query?;

    let record = state
        .shortener()
        .get(RecordId::new(id), OwnerId::new(query.owner_id))
        .await?;

    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn edit_note_handler(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    request: std::result::Result<Json<EditNoteRequest>, JsonRejection>,
) -> Result<Json<UrlResponse>> {
    let Path(id) = id?;
    let Json(request) = request?;

    let record = state
        .shortener()
        .edit_note(RecordId::new(id), OwnerId::new(request.owner_id), request.note)
        .await?;

    Ok(Json(UrlResponse::from_record(record, state.base_url())))
}

pub async fn delete_url_handler(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    query: std::result::Result<Query<OwnerQuery>, QueryRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    let Query(query) = query?;

    let deleted = state
        .shortener()
        .delete(RecordId::new(id), OwnerId::new(query.owner_id))
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ShortenerError::NotFound.into())
    }
}
