//! Short URL service implementation.
//!
//! [`ShortenerService`] creates, resolves, edits and deletes short URLs on top
//! of any [`UrlStore`](twurl_core::UrlStore); [`Paginator`] serves an owner's
//! records page by page.

pub mod pagination;
pub mod service;
pub mod settings;

pub use pagination::{Paginator, DEFAULT_PAGE_SIZE};
pub use service::ShortenerService;
pub use settings::ShortenerSettings;
pub use twurl_core::{Shortener, ShortenerError};
