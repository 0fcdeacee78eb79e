use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use twurl_core::{OwnerId, PageRequest, RecordId, ShortCode, ShortUrlRecord};
use twurl_shortener::DEFAULT_PAGE_SIZE;

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub original_url: String,
    pub owner_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUrlResponse {
    pub id: RecordId,
    pub short_code: ShortCode,
    pub short_url: String,
    pub original_url: String,
    pub created_at: Timestamp,
}

impl CreateUrlResponse {
    pub fn from_record(record: ShortUrlRecord, base_url: &str) -> Self {
        Self {
            id: record.id,
            short_url: record.short_code.to_url(base_url),
            short_code: record.short_code,
            original_url: record.original_url,
            created_at: record.created_at,
        }
    }
}

/// Full view of a record, as shown to its owner.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: RecordId,
    pub short_code: ShortCode,
    pub short_url: String,
    pub original_url: String,
    pub owner_id: OwnerId,
    pub created_at: Timestamp,
    pub clicks: u64,
    pub note: Option<String>,
}

impl UrlResponse {
    pub fn from_record(record: ShortUrlRecord, base_url: &str) -> Self {
        Self {
            id: record.id,
            short_url: record.short_code.to_url(base_url),
            short_code: record.short_code,
            original_url: record.original_url,
            owner_id: record.owner_id,
            created_at: record.created_at,
            clicks: record.clicks,
            note: record.note,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: i64,
}

/// An absent `note` clears the stored one.
#[derive(Debug, Deserialize)]
pub struct EditNoteRequest {
    pub owner_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListQuery {
    /// Negative values are passed on as 0 and clamped by the paginator.
    pub fn page_request(&self) -> PageRequest {
        let to_u32 = |value: i64| u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        PageRequest::new(
            self.page.map_or(1, to_u32),
            self.page_size.map_or(DEFAULT_PAGE_SIZE, to_u32),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
