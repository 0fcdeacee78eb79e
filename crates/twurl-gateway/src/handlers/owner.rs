use crate::error::Result;
use crate::model::{DeletedResponse, ListQuery, UrlResponse};
use crate::state::AppState;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::info;
use twurl_core::{OwnerId, Page};

pub async fn list_owner_urls_handler(
    State(state): State<AppState>,
    owner_id: std::result::Result<Path<i64>, PathRejection>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<UrlResponse>>> {
    let Path(owner_id) = owner_id?;
    let Query(query) = query?;

    let page = state
        .shortener()
        .list(OwnerId::new(owner_id), query.page_request())
        .await?;

    let base_url = state.base_url();
    Ok(Json(page.map(|record| UrlResponse::from_record(record, base_url))))
}

/// Cascade hook for the external account service.
pub async fn delete_owner_urls_handler(
    State(state): State<AppState>,
    owner_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>> {
    let Path(owner_id) = owner_id?;

    let deleted = state
        .shortener()
        .delete_by_owner(OwnerId::new(owner_id))
        .await?;

    info!(owner_id, deleted, "owner's short urls removed");
    Ok(Json(DeletedResponse { deleted }))
}
