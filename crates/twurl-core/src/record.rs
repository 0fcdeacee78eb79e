use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Store-assigned identifier of a [`ShortUrlRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the external user that owns a record.
///
/// Owner lifecycle is managed outside this crate; only positive ids are
/// accepted by the shortener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(i64);

impl OwnerId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored short URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    pub id: RecordId,
    /// The original URL that was shortened. Never changes after creation.
    pub original_url: String,
    /// Never changes after creation.
    pub short_code: ShortCode,
    pub owner_id: OwnerId,
    pub created_at: Timestamp,
    /// Number of successful resolutions; never decreases.
    pub clicks: u64,
    /// Free-form owner note, the only mutable field.
    pub note: Option<String>,
}

/// Insert payload for a [`UrlStore`](crate::UrlStore).
///
/// The store assigns the id and starts the click counter at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShortUrl {
    pub short_code: ShortCode,
    pub original_url: String,
    pub owner_id: OwnerId,
    pub created_at: Timestamp,
    pub note: Option<String>,
}

impl NewShortUrl {
    /// Materializes the record a store persists for this payload.
    pub fn into_record(self, id: RecordId) -> ShortUrlRecord {
        ShortUrlRecord {
            id,
            original_url: self.original_url,
            short_code: self.short_code,
            owner_id: self.owner_id,
            created_at: self.created_at,
            clicks: 0,
            note: self.note,
        }
    }
}

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(ShortUrlRecord),
    /// The short code is already taken; nothing was written.
    Collision,
}
