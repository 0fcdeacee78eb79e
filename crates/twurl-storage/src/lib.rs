//! Storage backends implementing [`UrlStore`].

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use twurl_core::repository::{Result, UrlStore};
pub use twurl_core::{InsertOutcome, StorageError};
