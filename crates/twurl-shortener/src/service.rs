use crate::pagination::Paginator;
use crate::settings::ShortenerSettings;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use twurl_core::validate::{validate_note, validate_url};
use twurl_core::{
    Clock, InsertOutcome, NewShortUrl, OwnerId, Page, PageRequest, RecordId, ShortCode,
    ShortUrlRecord, ShortenParams, Shortener, ShortenerError, SystemClock, UrlStore,
};
use twurl_generator::Generator;

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a [`UrlStore`], a [`Generator`] and a [`Clock`] to handle:
/// - URL, owner and note validation
/// - Short code generation with bounded retry on collision
/// - Resolution with best-effort click counting
/// - Owner-scoped edits, deletes and listings
///
/// The generator is not trusted to produce unique codes. Uniqueness is
/// enforced by the store and a collision simply triggers another draw, up to
/// `max_attempts` draws per create.
#[derive(Debug)]
pub struct ShortenerService<R, G, C = SystemClock> {
    repository: Arc<R>,
    generator: Arc<G>,
    clock: C,
    paginator: Paginator<R>,
    max_attempts: u32,
}

impl<R: UrlStore, G: Generator> ShortenerService<R, G, SystemClock> {
    /// Creates a new `ShortenerService` with default settings.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ShortenerSettings::default())
    }

    pub fn with_settings(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self::with_clock(repository, generator, SystemClock, settings)
    }
}

impl<R: UrlStore, G: Generator, C: Clock> ShortenerService<R, G, C> {
    /// Creates a service that stamps new records with `clock`.
    pub fn with_clock(repository: R, generator: G, clock: C, settings: ShortenerSettings) -> Self {
        let repository = Arc::new(repository);
        Self {
            paginator: Paginator::new(Arc::clone(&repository), settings.max_page_size),
            repository,
            generator: Arc::new(generator),
            clock,
            max_attempts: settings.max_attempts.max(1),
        }
    }

    /// Returns the underlying store.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn ensure_owner(owner: OwnerId) -> Result<(), ShortenerError> {
        if owner.is_valid() {
            Ok(())
        } else {
            Err(ShortenerError::validation(
                "owner_id",
                format!("owner id must be positive, got {owner}"),
            ))
        }
    }

    /// Current time at the precision every store keeps.
    fn now(&self) -> Timestamp {
        let now = self.clock.now();
        Timestamp::from_microsecond(now.as_microsecond()).unwrap_or(now)
    }

    fn generate_code(&self) -> ShortCode {
        self.generator.generate().into()
    }

    /// Counts a click for `code`. Failures are logged and swallowed: the
    /// caller already holds the URL and the redirect must not fail.
    async fn count_click(&self, code: &ShortCode) {
        match self.repository.increment_clicks(code).await {
            Ok(Some(record)) => trace!(code = %code, clicks = record.clicks, "click counted"),
            Ok(None) => debug!(code = %code, "short code removed before its click was counted"),
            Err(e) => warn!(code = %code, error = %e, "failed to count click"),
        }
    }
}

#[async_trait]
impl<R: UrlStore, G: Generator, C: Clock> Shortener for ShortenerService<R, G, C> {
    async fn create(&self, params: ShortenParams) -> Result<ShortUrlRecord, ShortenerError> {
        validate_url(&params.original_url)?;
        Self::ensure_owner(params.owner_id)?;
        validate_note(params.note.as_deref())?;

        let created_at = self.now();

        for attempt in 1..=self.max_attempts {
            let short_code = self.generate_code();
            let new = NewShortUrl {
                short_code: short_code.clone(),
                original_url: params.original_url.clone(),
                owner_id: params.owner_id,
                created_at,
                note: params.note.clone(),
            };

            match self.repository.insert(new).await? {
                InsertOutcome::Inserted(record) => {
                    debug!(
                        code = %record.short_code,
                        id = %record.id,
                        owner_id = %record.owner_id,
                        attempt,
                        "created short url"
                    );
                    return Ok(record);
                }
                InsertOutcome::Collision => {
                    debug!(code = %short_code, attempt, "short code collision, retrying");
                }
            }
        }

        warn!(
            owner_id = %params.owner_id,
            attempts = self.max_attempts,
            "gave up generating a unique short code"
        );
        Err(ShortenerError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }

    async fn resolve(&self, code: &str) -> Result<String, ShortenerError> {
        let Ok(code) = ShortCode::parse(code) else {
            trace!(candidate = ?code, "malformed short code");
            return Err(ShortenerError::NotFound);
        };

        let Some(record) = self.repository.find_by_code(&code).await? else {
            trace!(code = %code, "short code not found");
            return Err(ShortenerError::NotFound);
        };

        self.count_click(&code).await;

        debug!(code = %code, url = %record.original_url, "resolved short code");
        Ok(record.original_url)
    }

    async fn get(&self, id: RecordId, owner: OwnerId) -> Result<ShortUrlRecord, ShortenerError> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|record| record.owner_id == owner)
            .ok_or(ShortenerError::NotFound)
    }

    async fn edit_note(
        &self,
        id: RecordId,
        owner: OwnerId,
        note: Option<String>,
    ) -> Result<ShortUrlRecord, ShortenerError> {
        validate_note(note.as_deref())?;

        let record = self
            .repository
            .update_note(id, owner, note)
            .await?
            .ok_or(ShortenerError::NotFound)?;

        debug!(id = %id, owner_id = %owner, "updated note");
        Ok(record)
    }

    async fn delete(&self, id: RecordId, owner: OwnerId) -> Result<bool, ShortenerError> {
        let deleted = self.repository.delete_by_id(id, owner).await?;
        debug!(id = %id, owner_id = %owner, deleted, "delete short url");
        Ok(deleted)
    }

    async fn delete_by_owner(&self, owner: OwnerId) -> Result<u64, ShortenerError> {
        Self::ensure_owner(owner)?;

        let removed = self.repository.delete_by_owner(owner).await?;
        debug!(owner_id = %owner, removed, "removed owner's short urls");
        Ok(removed)
    }

    async fn list(
        &self,
        owner: OwnerId,
        request: PageRequest,
    ) -> Result<Page<ShortUrlRecord>, ShortenerError> {
        self.paginator.list(owner, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use twurl_core::repository::Result as StoreResult;
    use twurl_core::{FixedClock, Slice, StorageError};
    use twurl_generator::{RandomGenerator, SeqGenerator};
    use twurl_storage::InMemoryRepository;

    /// Replays a fixed list of codes, repeating the last one forever.
    struct ScriptedGenerator {
        codes: Vec<&'static str>,
        next: Mutex<usize>,
    }

    impl ScriptedGenerator {
        fn new(codes: Vec<&'static str>) -> Self {
            Self {
                codes,
                next: Mutex::new(0),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            let mut next = self.next.lock().unwrap();
            let code = self.codes[(*next).min(self.codes.len() - 1)];
            *next += 1;
            ShortCode::new_unchecked(code)
        }
    }

    /// Emits every code of a sequence twice, so each create after the first
    /// collides once before succeeding.
    struct StutteringGenerator {
        inner: SeqGenerator,
        pending: Mutex<Option<ShortCode>>,
    }

    impl Generator for StutteringGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            let mut pending = self.pending.lock().unwrap();
            match pending.take() {
                Some(code) => code,
                None => {
                    let code = self.inner.generate();
                    *pending = Some(code.clone());
                    code
                }
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        Clicks,
        Reads,
    }

    /// Delegates to an in-memory store but fails one kind of operation.
    struct FaultyStore {
        inner: InMemoryRepository,
        fault: Fault,
    }

    fn unavailable() -> StorageError {
        StorageError::Unavailable("connection refused".to_string())
    }

    #[async_trait]
    impl UrlStore for FaultyStore {
        async fn insert(&self, new: NewShortUrl) -> StoreResult<InsertOutcome> {
            self.inner.insert(new).await
        }

        async fn find_by_code(&self, code: &ShortCode) -> StoreResult<Option<ShortUrlRecord>> {
            if self.fault == Fault::Reads {
                return Err(unavailable());
            }
            self.inner.find_by_code(code).await
        }

        async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<ShortUrlRecord>> {
            self.inner.find_by_id(id).await
        }

        async fn increment_clicks(&self, code: &ShortCode) -> StoreResult<Option<ShortUrlRecord>> {
            if self.fault == Fault::Clicks {
                return Err(unavailable());
            }
            self.inner.increment_clicks(code).await
        }

        async fn list_by_owner(
            &self,
            owner: OwnerId,
            offset: u64,
            limit: u64,
        ) -> StoreResult<Slice<ShortUrlRecord>> {
            self.inner.list_by_owner(owner, offset, limit).await
        }

        async fn update_note(
            &self,
            id: RecordId,
            owner: OwnerId,
            note: Option<String>,
        ) -> StoreResult<Option<ShortUrlRecord>> {
            self.inner.update_note(id, owner, note).await
        }

        async fn delete_by_id(&self, id: RecordId, owner: OwnerId) -> StoreResult<bool> {
            self.inner.delete_by_id(id, owner).await
        }

        async fn delete_by_owner(&self, owner: OwnerId) -> StoreResult<u64> {
            self.inner.delete_by_owner(owner).await
        }
    }

    fn test_service() -> ShortenerService<InMemoryRepository, RandomGenerator> {
        ShortenerService::new(InMemoryRepository::new(), RandomGenerator::new())
    }

    fn params(url: &str, owner: i64) -> ShortenParams {
        ShortenParams {
            original_url: url.to_string(),
            owner_id: OwnerId::new(owner),
            note: None,
        }
    }

    fn invalid_field(err: ShortenerError) -> &'static str {
        match err {
            ShortenerError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_resolve_returns_the_original_url() {
        let service = test_service();
        let url = "https://example.com/path?q=1&r=%20x#frag";

        let record = service.create(params(url, 1)).await.unwrap();
        assert_eq!(record.original_url, url);
        assert_eq!(record.clicks, 0);
        assert!(ShortCode::parse(record.short_code.as_str()).is_ok());

        let resolved = service.resolve(record.short_code.as_str()).await.unwrap();
        assert_eq!(resolved, url);
    }

    #[tokio::test]
    async fn resolve_counts_one_click_per_call() {
        let service = test_service();
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        for _ in 0..3 {
            service.resolve(record.short_code.as_str()).await.unwrap();
        }

        let stored = service.get(record.id, OwnerId::new(1)).await.unwrap();
        assert_eq!(stored.clicks, 3);
    }

    #[tokio::test]
    async fn create_keeps_note() {
        let service = test_service();
        let mut p = params("https://example.com", 1);
        p.note = Some("for the newsletter".to_string());

        let record = service.create(p).await.unwrap();
        assert_eq!(record.note.as_deref(), Some("for the newsletter"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let service = test_service();

        let err = service.create(params("not-a-valid-url", 1)).await.unwrap_err();
        assert_eq!(invalid_field(err), "original_url");

        let err = service
            .create(params("https://example.com", 0))
            .await
            .unwrap_err();
        assert_eq!(invalid_field(err), "owner_id");

        let mut p = params("https://example.com", 1);
        p.note = Some("n".repeat(5001));
        let err = service.create(p).await.unwrap_err();
        assert_eq!(invalid_field(err), "note");

        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn create_retries_past_collisions() {
        let service = ShortenerService::new(
            InMemoryRepository::new(),
            ScriptedGenerator::new(vec!["aaaaaa", "aaaaaa", "bbbbbb", "aaaaaa", "bbbbbb", "cccccc"]),
        );

        let first = service.create(params("https://one.example", 1)).await.unwrap();
        let second = service.create(params("https://two.example", 1)).await.unwrap();
        let third = service.create(params("https://three.example", 1)).await.unwrap();

        assert_eq!(first.short_code.as_str(), "aaaaaa");
        assert_eq!(second.short_code.as_str(), "bbbbbb");
        assert_eq!(third.short_code.as_str(), "cccccc");
        assert_eq!(
            service.resolve("aaaaaa").await.unwrap(),
            "https://one.example"
        );
    }

    #[tokio::test]
    async fn create_gives_up_after_max_attempts() {
        let settings = ShortenerSettings::builder().max_attempts(3).build();
        let service = ShortenerService::with_settings(
            InMemoryRepository::new(),
            ScriptedGenerator::new(vec!["zzzzzz"]),
            settings,
        );

        service.create(params("https://one.example", 1)).await.unwrap();
        let err = service
            .create(params("https://two.example", 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::GenerationExhausted { attempts: 3 }
        ));
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test]
    async fn forced_collisions_never_duplicate_codes() {
        let generator = StutteringGenerator {
            inner: SeqGenerator::new(),
            pending: Mutex::new(None),
        };
        let service = ShortenerService::new(InMemoryRepository::new(), generator);

        let mut codes = std::collections::HashSet::new();
        for i in 0..25 {
            let record = service
                .create(params(&format!("https://example.com/{i}"), 1))
                .await
                .unwrap();
            assert!(codes.insert(record.short_code));
        }
        assert_eq!(service.repository().len(), 25);
    }

    #[tokio::test]
    async fn malformed_codes_look_exactly_like_missing_ones() {
        let service = test_service();
        service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        for candidate in ["ab", "toolong123", "has spaces", "emoji😀!", "", "abc-12", "ZZZZZZ"] {
            let err = service.resolve(candidate).await.unwrap_err();
            assert!(
                matches!(err, ShortenerError::NotFound),
                "{candidate:?} gave {err:?}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_count_every_click() {
        let service = Arc::new(test_service());
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let service = Arc::clone(&service);
                let code = record.short_code.clone();
                tokio::spawn(async move { service.resolve(code.as_str()).await.unwrap() })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "https://example.com");
        }

        let stored = service.get(record.id, OwnerId::new(1)).await.unwrap();
        assert_eq!(stored.clicks, 100);
    }

    #[tokio::test]
    async fn failed_click_count_does_not_fail_the_redirect() {
        let store = FaultyStore {
            inner: InMemoryRepository::new(),
            fault: Fault::Clicks,
        };
        let service = ShortenerService::new(store, RandomGenerator::new());
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        let url = service.resolve(record.short_code.as_str()).await.unwrap();
        assert_eq!(url, "https://example.com");

        let stored = service.get(record.id, OwnerId::new(1)).await.unwrap();
        assert_eq!(stored.clicks, 0);
    }

    #[tokio::test]
    async fn store_failure_on_lookup_is_surfaced() {
        let store = FaultyStore {
            inner: InMemoryRepository::new(),
            fault: Fault::Reads,
        };
        let service = ShortenerService::new(store, RandomGenerator::new());

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, ShortenerError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn resolve_after_delete_is_not_found() {
        let service = test_service();
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        assert!(service.delete(record.id, OwnerId::new(1)).await.unwrap());
        let err = service
            .resolve(record.short_code.as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound));
    }

    #[tokio::test]
    async fn delete_succeeds_once_then_fails() {
        let service = test_service();
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        assert!(!service.delete(RecordId::new(999), OwnerId::new(1)).await.unwrap());
        assert!(!service.delete(record.id, OwnerId::new(2)).await.unwrap());
        assert!(service.delete(record.id, OwnerId::new(1)).await.unwrap());
        assert!(!service.delete(record.id, OwnerId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn edit_note_is_owner_scoped() {
        let service = test_service();
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        let err = service
            .edit_note(record.id, OwnerId::new(2), Some("mine now".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound));

        let updated = service
            .edit_note(record.id, OwnerId::new(1), Some("video link".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("video link"));
        assert_eq!(updated.short_code, record.short_code);
        assert_eq!(updated.original_url, record.original_url);
        assert_eq!(updated.created_at, record.created_at);

        let err = service
            .edit_note(record.id, OwnerId::new(1), Some("x".repeat(5001)))
            .await
            .unwrap_err();
        assert_eq!(invalid_field(err), "note");

        let err = service
            .edit_note(RecordId::new(404), OwnerId::new(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound));
    }

    #[tokio::test]
    async fn get_hides_foreign_records() {
        let service = test_service();
        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();

        assert_eq!(service.get(record.id, OwnerId::new(1)).await.unwrap(), record);
        let err = service.get(record.id, OwnerId::new(2)).await.unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound));
    }

    #[tokio::test]
    async fn delete_by_owner_removes_all_of_them() {
        let service = test_service();
        for i in 0..3 {
            service
                .create(params(&format!("https://example.com/{i}"), 1))
                .await
                .unwrap();
        }
        let kept = service
            .create(params("https://example.com/kept", 2))
            .await
            .unwrap();

        assert_eq!(service.delete_by_owner(OwnerId::new(1)).await.unwrap(), 3);
        let page = service
            .list(OwnerId::new(1), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_items, 0);
        assert_eq!(
            service.resolve(kept.short_code.as_str()).await.unwrap(),
            "https://example.com/kept"
        );

        let err = service.delete_by_owner(OwnerId::new(-1)).await.unwrap_err();
        assert_eq!(invalid_field(err), "owner_id");
    }

    #[tokio::test]
    async fn created_at_keeps_microsecond_precision() {
        let clock = FixedClock::new(Timestamp::new(1_700_000_000, 123_456_789).unwrap());
        let service = ShortenerService::with_clock(
            InMemoryRepository::new(),
            SeqGenerator::new(),
            clock,
            ShortenerSettings::default(),
        );

        let record = service
            .create(params("https://example.com", 1))
            .await
            .unwrap();
        assert_eq!(record.created_at.subsec_nanosecond(), 123_456_000);

        let fetched = service.get(record.id, OwnerId::new(1)).await.unwrap();
        assert_eq!(fetched.created_at, record.created_at);
    }

    #[tokio::test]
    async fn identical_timestamps_list_by_descending_id() {
        let clock = FixedClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let service = ShortenerService::with_clock(
            InMemoryRepository::new(),
            SeqGenerator::new(),
            clock,
            ShortenerSettings::default(),
        );

        let mut created = Vec::new();
        for i in 0..4 {
            let record = service
                .create(params(&format!("https://example.com/{i}"), 1))
                .await
                .unwrap();
            created.push(record.id);
        }

        let page = service
            .list(OwnerId::new(1), PageRequest::new(1, 10))
            .await
            .unwrap();
        let listed: Vec<_> = page.items.iter().map(|r| r.id).collect();
        created.reverse();
        assert_eq!(listed, created);
    }
}
