use std::sync::Arc;

use tracing::trace;
use twurl_core::{OwnerId, Page, PageRequest, ShortUrlRecord, ShortenerError, UrlStore};

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Serves an owner's records page by page, newest first.
///
/// Paging values are clamped instead of rejected: a page below 1 is page 1,
/// a page size below 1 is 1 and one above `max_page_size` is `max_page_size`.
#[derive(Debug)]
pub struct Paginator<R> {
    repository: Arc<R>,
    max_page_size: u32,
}

impl<R: UrlStore> Paginator<R> {
    pub fn new(repository: Arc<R>, max_page_size: u32) -> Self {
        Self {
            repository,
            max_page_size: max_page_size.max(1),
        }
    }

    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    pub async fn list(
        &self,
        owner: OwnerId,
        request: PageRequest,
    ) -> Result<Page<ShortUrlRecord>, ShortenerError> {
        if !owner.is_valid() {
            return Err(ShortenerError::validation(
                "owner_id",
                format!("owner id must be positive, got {owner}"),
            ));
        }

        let request = request.clamped(self.max_page_size);
        let slice = self
            .repository
            .list_by_owner(owner, request.offset(), request.limit())
            .await?;

        trace!(
            owner_id = %owner,
            page = request.page,
            page_size = request.page_size,
            total = slice.total,
            "listed owner records"
        );

        Ok(Page::new(request, slice))
    }
}
