use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;
use twurl_core::repository::{Result, UrlStore};
use twurl_core::{
    InsertOutcome, NewShortUrl, OwnerId, RecordId, ShortCode, ShortUrlRecord, Slice,
};

/// In-memory implementation of [`UrlStore`] using DashMap.
///
/// Records live in a map keyed by id; a second map from short code to id acts
/// as the unique index. DashMap's sharded locks let operations on different
/// records proceed without blocking each other, while every mutation of one
/// record happens under its shard lock. No operation awaits while holding a
/// lock, so dropping a future never leaves a half-applied change behind.
#[derive(Debug)]
pub struct InMemoryRepository {
    records: DashMap<RecordId, ShortUrlRecord>,
    codes: DashMap<ShortCode, RecordId>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            codes: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlStore for InMemoryRepository {
    async fn insert(&self, new: NewShortUrl) -> Result<InsertOutcome> {
        // The vacant entry keeps the code's shard locked until the index is
        // written, so two inserts of one code cannot both succeed.
        match self.codes.entry(new.short_code.clone()) {
            Entry::Occupied(_) => {
                trace!(code = %new.short_code, "short code already taken");
                Ok(InsertOutcome::Collision)
            }
            Entry::Vacant(slot) => {
                let id = RecordId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
                let record = new.into_record(id);
                // The record goes in before the index entry so a lookup by
                // code never sees an id without its record.
                self.records.insert(id, record.clone());
                slot.insert(id);
                Ok(InsertOutcome::Inserted(record))
            }
        }
    }

    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        let Some(id) = self.codes.get(code).map(|entry| *entry.value()) else {
            return Ok(None);
        };

        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<ShortUrlRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<Option<ShortUrlRecord>> {
        let Some(id) = self.codes.get(code).map(|entry| *entry.value()) else {
            return Ok(None);
        };

        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(None);
        };

        let record = entry.value_mut();
        record.clicks = record.clicks.saturating_add(1);
        Ok(Some(record.clone()))
    }

    async fn list_by_owner(
        &self,
        owner: OwnerId,
        offset: u64,
        limit: u64,
    ) -> Result<Slice<ShortUrlRecord>> {
        let mut owned: Vec<ShortUrlRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().owner_id == owner)
            .map(|entry| entry.value().clone())
            .collect();

        owned.sort_by_key(|record| Reverse((record.created_at, record.id)));

        let total = owned.len() as u64;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = owned.into_iter().skip(offset).take(limit).collect();

        Ok(Slice { items, total })
    }

    async fn update_note(
        &self,
        id: RecordId,
        owner: OwnerId,
        note: Option<String>,
    ) -> Result<Option<ShortUrlRecord>> {
        let Some(mut entry) = self.records.get_mut(&id) else {
            return Ok(None);
        };

        let record = entry.value_mut();
        if record.owner_id != owner {
            return Ok(None);
        }

        record.note = note;
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: RecordId, owner: OwnerId) -> Result<bool> {
        let Some((_, record)) = self
            .records
            .remove_if(&id, |_, record| record.owner_id == owner)
        else {
            return Ok(false);
        };

        self.codes.remove(&record.short_code);
        Ok(true)
    }

    async fn delete_by_owner(&self, owner: OwnerId) -> Result<u64> {
        let mut released = Vec::new();
        self.records.retain(|_, record| {
            if record.owner_id == owner {
                released.push(record.short_code.clone());
                false
            } else {
                true
            }
        });

        for code in &released {
            self.codes.remove(code);
        }

        Ok(released.len() as u64)
    }
}
