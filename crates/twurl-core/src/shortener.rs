use crate::page::{Page, PageRequest};
use crate::record::{OwnerId, RecordId, ShortUrlRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// The external user the record belongs to.
    pub owner_id: OwnerId,
    /// Optional owner note.
    pub note: Option<String>,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Validates the input, picks an unused short code and stores the record.
    async fn create(&self, params: ShortenParams) -> Result<ShortUrlRecord>;

    /// Resolves a candidate code to its original URL and counts the click.
    ///
    /// Malformed and unknown codes both yield
    /// [`ShortenerError::NotFound`](crate::ShortenerError::NotFound).
    async fn resolve(&self, code: &str) -> Result<String>;

    /// Fetches a record owned by `owner`.
    async fn get(&self, id: RecordId, owner: OwnerId) -> Result<ShortUrlRecord>;

    /// Replaces the note of a record owned by `owner`.
    async fn edit_note(
        &self,
        id: RecordId,
        owner: OwnerId,
        note: Option<String>,
    ) -> Result<ShortUrlRecord>;

    /// Deletes a record owned by `owner`.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, id: RecordId, owner: OwnerId) -> Result<bool>;

    /// Removes every record of an owner whose account is being deleted.
    async fn delete_by_owner(&self, owner: OwnerId) -> Result<u64>;

    /// Lists an owner's records, newest first.
    async fn list(&self, owner: OwnerId, request: PageRequest) -> Result<Page<ShortUrlRecord>>;
}
