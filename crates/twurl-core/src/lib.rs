//! Core types and traits for the twurl URL shortener.
//!
//! This crate provides the data model, the [`UrlStore`] port implemented by
//! the storage crate and the [`Shortener`] contract served by the gateway.

pub mod clock;
pub mod error;
pub mod page;
pub mod record;
pub mod repository;
pub mod shortcode;
pub mod shortener;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, ShortenerError, StorageError};
pub use page::{Page, PageRequest, Slice};
pub use record::{InsertOutcome, NewShortUrl, OwnerId, RecordId, ShortUrlRecord};
pub use repository::UrlStore;
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
