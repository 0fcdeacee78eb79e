use crate::error::StorageError;
use crate::page::Slice;
use crate::record::{InsertOutcome, NewShortUrl, OwnerId, RecordId, ShortUrlRecord};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable mapping of short codes to [`ShortUrlRecord`]s.
///
/// Every mutation is visible to subsequent reads once it returns. Implementations
/// must enforce short code uniqueness atomically and must never lose a click
/// increment under concurrent calls for the same code.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Inserts a new record. Returns [`InsertOutcome::Collision`] if the short
    /// code is already taken.
    async fn insert(&self, new: NewShortUrl) -> Result<InsertOutcome>;

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>>;

    async fn find_by_id(&self, id: RecordId) -> Result<Option<ShortUrlRecord>>;

    /// Atomically adds one click and returns the updated record.
    /// Returns `None` if the code does not exist.
    async fn increment_clicks(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>>;

    /// Returns one window of an owner's records, newest first with ties
    /// broken by descending id, together with the owner's total record count.
    async fn list_by_owner(
        &self,
        owner: OwnerId,
        offset: u64,
        limit: u64,
    ) -> Result<Slice<ShortUrlRecord>>;

    /// Replaces the note of the record `id` if it belongs to `owner`.
    async fn update_note(
        &self,
        id: RecordId,
        owner: OwnerId,
        note: Option<String>,
    ) -> Result<Option<ShortUrlRecord>>;

    /// Deletes the record `id` if it belongs to `owner`.
    /// Returns `true` if a record was removed.
    async fn delete_by_id(&self, id: RecordId, owner: OwnerId) -> Result<bool>;

    /// Deletes every record of `owner`, returning how many were removed.
    async fn delete_by_owner(&self, owner: OwnerId) -> Result<u64>;
}
